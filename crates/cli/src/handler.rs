//! Error reporting.

/// Installs the `color-eyre` panic and error report handlers.
///
/// Reports are printed without the environment and location sections, the message chain is what
/// operators need to act on.
pub fn install() {
    let hook = color_eyre::config::HookBuilder::default()
        .display_env_section(false)
        .display_location_section(false);
    if let Err(err) = hook.install() {
        debug!("failed to install error handler: {err}");
    }
}
