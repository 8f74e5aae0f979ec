pub struct Icons;

impl Icons {
    pub const ROCKET: &str = "🚀";
    pub const SEARCH: &str = "🔍";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const LINK: &str = "🔗";
    pub const FILE: &str = "📄";
    pub const DEL: &str = "🗑️";
    pub const PACKAGE: &str = "📦";
    pub const FOLDER: &str = "📂";
    pub const CLOCK: &str = "⏱️";
}
