use crate::cli::args::CliArgs;
use crate::output::OutputFormat;

pub const MAX_DEBOUNCE_MS: u64 = 10_000;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(raw) = args.output_format.as_deref() {
        if OutputFormat::parse(raw).is_none() {
            return Err(format!(
                "invalid --format '{raw}', expected text, json, or html"
            ));
        }
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid timeout, expected positive integer".to_string());
        }
    }
    if let Some(ms) = args.debounce_ms {
        validate_debounce_ms(ms)?;
    }
    if let Some(device) = args.device.as_deref() {
        if device.trim().is_empty() {
            return Err("invalid --device, expected a device id".to_string());
        }
        if args.interactive {
            return Err("use either --device or --interactive, not both".to_string());
        }
        if args.brands {
            return Err("use either --device or --brands, not both".to_string());
        }
    }
    if let Some(brand) = args.brand.as_deref() {
        if brand.trim().is_empty() {
            return Err("invalid --brand, expected a brand name or 'all'".to_string());
        }
    }
    Ok(())
}

pub fn validate_debounce_ms(ms: u64) -> Result<(), String> {
    if ms == 0 || ms > MAX_DEBOUNCE_MS {
        return Err(format!(
            "invalid debounce interval {ms}ms, expected 1-{MAX_DEBOUNCE_MS}"
        ));
    }
    Ok(())
}
