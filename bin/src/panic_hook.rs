/// Sets a panic hook that routes panics through the logger before the default
/// report is printed.
pub fn set() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = if let Some(s) = info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            info.to_string()
        };

        match info.location() {
            Some(loc) => tracing::error!(file = loc.file(), line = loc.line(), "panic: {msg}"),
            None => tracing::error!("panic: {msg}"),
        }

        default_hook(info);
    }));
}
