//! Environment-variable configuration loading, prefix `IMAGE_LAB_`.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use super::schema::PipelineDefaults;
use crate::error::{Result, StoreError};

const PREFIX: &str = "IMAGE_LAB_";

fn parse_env<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(format!("{PREFIX}{name}")) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| StoreError::Config(format!("{PREFIX}{name} is not a valid value: {raw:?}"))),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => {
            Err(StoreError::Config(format!("{PREFIX}{name} is not valid UTF-8")))
        }
    }
}

/// Load [`PipelineDefaults`], overriding each field from its `IMAGE_LAB_`
/// environment variable when present. Fails if a present variable cannot
/// be parsed as the expected type.
pub fn load_from_env() -> Result<PipelineDefaults> {
    let mut defaults = PipelineDefaults::default();

    if let Some(raw) = env::var_os(format!("{PREFIX}DATA_DIR")) {
        defaults.data_dir = PathBuf::from(raw);
    }
    if let Some(v) = parse_env::<u64>("METRICS_WINDOW_SECONDS")? {
        defaults.metrics_window_seconds = v;
    }
    if let Some(v) = parse_env::<usize>("SSE_QUEUE_SIZE")? {
        defaults.sse_queue_size = v;
    }
    if let Some(v) = parse_env::<usize>("MAX_CHUNK_SIZE")? {
        defaults.max_chunk_size = v;
    }
    if let Some(v) = parse_env::<usize>("DEFAULT_RS_N")? {
        defaults.default_rs_n = v;
    }
    if let Some(v) = parse_env::<usize>("DEFAULT_RS_K")? {
        defaults.default_rs_k = v;
    }

    Ok(defaults)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults_apply_with_no_env() {
        let _guard = ENV_LOCK.lock().unwrap();
        for key in [
            "IMAGE_LAB_DATA_DIR",
            "IMAGE_LAB_METRICS_WINDOW_SECONDS",
            "IMAGE_LAB_SSE_QUEUE_SIZE",
            "IMAGE_LAB_MAX_CHUNK_SIZE",
            "IMAGE_LAB_DEFAULT_RS_N",
            "IMAGE_LAB_DEFAULT_RS_K",
        ] {
            env::remove_var(key);
        }

        let cfg = load_from_env().unwrap();
        let defaults = PipelineDefaults::default();
        assert_eq!(cfg.metrics_window_seconds, defaults.metrics_window_seconds);
        assert_eq!(cfg.default_rs_n, defaults.default_rs_n);
    }

    #[test]
    fn overrides_are_applied() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("IMAGE_LAB_MAX_CHUNK_SIZE", "1024");
        env::set_var("IMAGE_LAB_DEFAULT_RS_N", "16");

        let cfg = load_from_env().unwrap();
        assert_eq!(cfg.max_chunk_size, 1024);
        assert_eq!(cfg.default_rs_n, 16);

        env::remove_var("IMAGE_LAB_MAX_CHUNK_SIZE");
        env::remove_var("IMAGE_LAB_DEFAULT_RS_N");
    }

    #[test]
    fn malformed_value_is_a_config_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("IMAGE_LAB_SSE_QUEUE_SIZE", "not-a-number");

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));

        env::remove_var("IMAGE_LAB_SSE_QUEUE_SIZE");
    }
}
