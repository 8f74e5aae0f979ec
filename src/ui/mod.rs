pub mod icons;
pub mod output;
pub mod progress;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{error, header, info, status, success, timing, warn};
pub use progress::Spinner;
pub use table::{dependents_table, report_table, TableBuilder};
pub use theme::{theme, Theme};
