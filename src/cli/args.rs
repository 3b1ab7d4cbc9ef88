use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "romcatalog",
    version,
    about = "browse and download havocOOS ROM builds",
    long_about = "romcatalog reads the device catalog served by the downloads site and renders the device list or a single device page.\n\nExamples:\n  romcatalog -u https://example.com/data/devices.json\n  romcatalog -u ./data/devices.json -b xiaomi -s poco\n  romcatalog -u ./data/devices.json -d alioth -o alioth.html\n  romcatalog -u ./data/devices.json -i\n\nTip: Use --config to persist the catalog location and keep CLI invocations short."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv, -vvv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'c',
        long = "color",
        help_heading = "Output",
        help = "Enable colored output (overrides --no-color)."
    )]
    pub color: bool,

    #[arg(
        short = 'n',
        long = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write the rendered page to a file instead of stdout."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'f',
        long = "format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format: text, json, or html (inferred from --output when omitted)."
    )]
    pub output_format: Option<String>,

    #[arg(
        long = "synthesize-history",
        num_args = 0..=1,
        default_missing_value = "true",
        help_heading = "Output",
        help = "Derive two prior versions for devices without a build list."
    )]
    pub synthesize_history: Option<bool>,

    #[arg(
        short = 'C',
        long = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.romcatalog/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "init-config",
        help_heading = "Input",
        help = "Write a default config file if none exists, then exit."
    )]
    pub init_config: bool,

    #[arg(
        short = 'u',
        long = "catalog",
        visible_alias = "url",
        value_name = "URL|FILE",
        help_heading = "Input",
        help = "Catalog resource (http(s) URL or local path)."
    )]
    pub catalog: Option<String>,

    #[arg(
        long = "site-root",
        value_name = "URL|DIR",
        help_heading = "Input",
        help = "Base for relative per-device data files (defaults to the catalog's directory)."
    )]
    pub site_root: Option<String>,

    #[arg(
        short = 'd',
        long = "device",
        visible_alias = "id",
        value_name = "ID",
        help_heading = "Pages",
        help = "Render the detail page of one device."
    )]
    pub device: Option<String>,

    #[arg(
        short = 'b',
        long = "brand",
        value_name = "BRAND",
        help_heading = "Pages",
        help = "Only list devices of this brand (\"all\" for no restriction)."
    )]
    pub brand: Option<String>,

    #[arg(
        short = 's',
        long = "search",
        value_name = "TEXT",
        help_heading = "Pages",
        help = "Only list devices whose name or codename contains TEXT."
    )]
    pub search: Option<String>,

    #[arg(
        long = "brands",
        help_heading = "Pages",
        help = "Print the brands present in the catalog."
    )]
    pub brands: bool,

    #[arg(
        short = 'i',
        long = "interactive",
        help_heading = "Pages",
        help = "Read search input from stdin and re-render as it settles."
    )]
    pub interactive: bool,

    #[arg(
        long = "debounce-ms",
        value_name = "MS",
        help_heading = "Pages",
        help = "Quiescence interval before interactive search input applies."
    )]
    pub debounce_ms: Option<u64>,

    #[arg(
        short = 't',
        long = "timeout",
        value_name = "SECONDS",
        help_heading = "HTTP",
        help = "Request timeout in seconds."
    )]
    pub timeout: Option<usize>,

    #[arg(
        short = 'p',
        long = "proxy",
        value_name = "URL",
        help_heading = "HTTP",
        help = "Send requests through this proxy."
    )]
    pub proxy: Option<String>,

    #[arg(
        long = "user-agent",
        value_name = "UA",
        help_heading = "HTTP",
        help = "User-Agent header for requests."
    )]
    pub user_agent: Option<String>,
}
