use std::sync::OnceLock;

static QUIET: OnceLock<bool> = OnceLock::new();

/// Set `REVDEPS_QUIET=1` to silence spinners and status lines
pub fn is_quiet() -> bool {
    *QUIET.get_or_init(|| {
        std::env::var("REVDEPS_QUIET")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    })
}
