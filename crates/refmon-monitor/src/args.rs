//! Command-line options

use anyhow::{bail, Context, Result};
use std::path::PathBuf;

/// One heater setting requested on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatRequest {
    pub tray: usize,
    pub heater: usize,
    pub percent: u8,
}

impl HeatRequest {
    /// Parse `TRAY:HEATER:PERCENT`
    pub fn parse(text: &str) -> Result<Self> {
        let fields: Vec<&str> = text.split(':').collect();
        let [tray, heater, percent] = fields.as_slice() else {
            bail!("expected TRAY:HEATER:PERCENT, got '{text}'");
        };
        Ok(Self {
            tray: tray.parse().with_context(|| format!("bad tray '{tray}'"))?,
            heater: heater
                .parse()
                .with_context(|| format!("bad heater '{heater}'"))?,
            percent: percent
                .parse()
                .with_context(|| format!("bad percent '{percent}'"))?,
        })
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct Options {
    pub config: Option<PathBuf>,
    pub list_ports: bool,
    pub demo: bool,
    pub diagnose: bool,
    pub once: bool,
    pub heat: Vec<HeatRequest>,
    pub help: bool,
}

impl Options {
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
        let mut options = Options::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    let path = args.next().context("--config needs a path")?;
                    options.config = Some(PathBuf::from(path));
                }
                "--list-ports" | "-l" => options.list_ports = true,
                "--demo" => options.demo = true,
                "--diagnose" | "-d" => options.diagnose = true,
                "--once" => options.once = true,
                "--heat" => {
                    let text = args.next().context("--heat needs TRAY:HEATER:PERCENT")?;
                    options.heat.push(HeatRequest::parse(&text)?);
                }
                "--help" | "-h" => options.help = true,
                other => bail!("unknown option '{other}' (try --help)"),
            }
        }
        Ok(options)
    }
}

pub fn print_help() {
    println!("Reference data monitor");
    println!();
    println!("Usage: refmon-monitor [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -c, --config PATH       Monitor configuration (JSON)");
    println!("  -l, --list-ports        List serial ports and exit");
    println!("      --demo              Use simulated boards instead of serial ports");
    println!("  -d, --diagnose          Run the connection test and exit");
    println!("      --once              Save the first complete sample and exit");
    println!("      --heat T:H:PCT      Set heater H (0-1) of tray T (0-5) to PCT percent");
    println!("  -h, --help              Show this help");
    println!();
    println!("Log verbosity follows RUST_LOG (default: info).");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Options> {
        Options::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_options() {
        let options = parse(&["--demo", "-c", "rig.json", "--heat", "2:1:60"]).unwrap();
        assert!(options.demo);
        assert!(!options.once);
        assert_eq!(options.config, Some(PathBuf::from("rig.json")));
        assert_eq!(
            options.heat,
            vec![HeatRequest {
                tray: 2,
                heater: 1,
                percent: 60
            }]
        );
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(parse(&["--bogus"]).is_err());
        assert!(parse(&["--config"]).is_err());
        assert!(parse(&["--heat", "2:60"]).is_err());
        assert!(parse(&["--heat", "2:1:300"]).is_err());
    }
}
