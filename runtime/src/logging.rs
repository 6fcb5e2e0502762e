//! Tracing subscriber setup for the binary.

use tracing_subscriber::EnvFilter;

/// Directive used when `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVE: &str = "faq_harvest=info,faq_harvest_runtime=info";

/// Build the filter from `RUST_LOG`, falling back to [`DEFAULT_DIRECTIVE`].
/// `verbose` raises both crates to `debug`.
pub fn env_filter(verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new("faq_harvest=debug,faq_harvest_runtime=debug");
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Install the global subscriber on stderr: human-readable, or one JSON
/// object per line with `json`. A second call is a no-op.
pub fn init(json: bool, verbose: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_writer(std::io::stderr);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_filter() {
        let filter = env_filter(true).to_string();
        assert!(filter.contains("faq_harvest=debug"));
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init(false, false);
        init(true, false);
    }
}
