// FILE: src/cli/mod.rs

mod config;
mod handlers;

use crate::error::Result;
use crate::ConverterOptions;
use clap::{Arg, ArgAction, Command, ValueEnum};
use std::time::Instant;

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Debug,
    Json,
}

pub struct EnhancedCli {
    config: config::ConfigFile,
    start_time: Instant,
}

impl Default for EnhancedCli {
    fn default() -> Self {
        Self::new()
    }
}

impl EnhancedCli {
    pub fn new() -> Self {
        Self {
            config: config::ConfigFile::default(),
            start_time: Instant::now(),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        self.start_time = Instant::now();
        let matches = self.build_cli().get_matches();

        if let Some(config_path) = matches.get_one::<String>("config") {
            self.config = config::load(config_path)?;
        }

        self.setup_logging(matches.get_count("verbose"))?;

        let result = match matches.subcommand() {
            Some(("to-ui", sub_matches)) => handlers::handle_to_ui_command(self, sub_matches),
            Some(("to-json", sub_matches)) => handlers::handle_to_json_command(self, sub_matches),
            Some(("from-json", sub_matches)) => handlers::handle_from_json_command(self, sub_matches),
            Some(("json-to-ui", sub_matches)) => handlers::handle_json_to_ui_command(self, sub_matches),
            Some(("inspect", sub_matches)) => handlers::handle_inspect_command(self, sub_matches),
            _ => {
                println!("No subcommand specified. Use --help for usage information.");
                Ok(())
            }
        };
        log::debug!("Finished in {}ms", self.start_time.elapsed().as_millis());
        result
    }

    fn build_cli(&self) -> Command {
        Command::new(crate::NAME)
            .version(crate::VERSION)
            .about(crate::DESCRIPTION)
            .author("Wirec Development Team")
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("Configuration file path (.json or .toml)")
                    .action(ArgAction::Set),
            )
            .arg(
                Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .help("Increase verbosity (can be used multiple times)")
                    .action(ArgAction::Count),
            )
            .subcommand(
                Command::new("to-ui")
                    .about("Convert a wireframe store to UI markup files")
                    .arg(Arg::new("input").help("Input .bmpr store, or a directory with --recursive").required(true).index(1))
                    .arg(Arg::new("output").short('o').long("output").value_name("DIR").help("Output directory for markup files"))
                    .arg(Arg::new("recursive").short('r').long("recursive").help("Convert every .bmpr store below the input directory").action(ArgAction::SetTrue))
                    .arg(Arg::new("skip").short('s').long("skip").value_name("PATTERN").help("Leave out documents whose name contains PATTERN").action(ArgAction::Append))
                    .arg(Arg::new("form-name").long("form-name").value_name("NAME").help("Form name for screens without a window frame"))
                    .arg(Arg::new("debug").short('d').long("debug").help("Enable debug mode with extra logging").action(ArgAction::SetTrue))
                    .arg(Arg::new("stats").long("stats").help("Show detailed conversion statistics").action(ArgAction::SetTrue)),
            )
            .subcommand(
                Command::new("to-json")
                    .about("Convert a wireframe store to a canonical JSON document")
                    .arg(Arg::new("input").help("Input .bmpr store").required(true).index(1))
                    .arg(Arg::new("output").short('o').long("output").value_name("FILE").help("Output JSON file"))
                    .arg(Arg::new("debug").short('d').long("debug").help("Enable debug mode with extra logging").action(ArgAction::SetTrue))
                    .arg(Arg::new("stats").long("stats").help("Show detailed conversion statistics").action(ArgAction::SetTrue)),
            )
            .subcommand(
                Command::new("from-json")
                    .about("Insert or update a canonical JSON document into a wireframe store")
                    .arg(Arg::new("input").help("Input JSON document").required(true).index(1))
                    .arg(Arg::new("store").help("Target .bmpr store (created when missing)").required(true).index(2))
                    .arg(Arg::new("debug").short('d').long("debug").help("Enable debug mode with extra logging").action(ArgAction::SetTrue))
                    .arg(Arg::new("stats").long("stats").help("Show detailed conversion statistics").action(ArgAction::SetTrue)),
            )
            .subcommand(
                Command::new("json-to-ui")
                    .about("Convert a canonical JSON document to UI markup files")
                    .arg(Arg::new("input").help("Input JSON document").required(true).index(1))
                    .arg(Arg::new("output").short('o').long("output").value_name("DIR").help("Output directory for markup files"))
                    .arg(Arg::new("skip").short('s').long("skip").value_name("PATTERN").help("Leave out documents whose name contains PATTERN").action(ArgAction::Append))
                    .arg(Arg::new("form-name").long("form-name").value_name("NAME").help("Form name for screens without a window frame"))
                    .arg(Arg::new("debug").short('d').long("debug").help("Enable debug mode with extra logging").action(ArgAction::SetTrue))
                    .arg(Arg::new("stats").long("stats").help("Show detailed conversion statistics").action(ArgAction::SetTrue)),
            )
            .subcommand(
                Command::new("inspect")
                    .about("Show the records and screens of a wireframe store")
                    .arg(Arg::new("input").help("Input .bmpr store").required(true).index(1))
                    .arg(Arg::new("output").short('o').long("output").value_name("FILE").help("Write the report to a file"))
                    .arg(Arg::new("format").short('f').long("format").value_parser(clap::value_parser!(OutputFormat)).default_value("debug").help("Report format")),
            )
    }

    fn setup_logging(&self, verbose_count: u8) -> Result<()> {
        let log_level = match verbose_count {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };
        env_logger::Builder::from_default_env()
            .filter_level(log_level)
            .format_timestamp_secs()
            .init();
        Ok(())
    }

    /// Merge command-line flags over the configuration file over defaults.
    pub fn build_converter_options(&self, matches: &clap::ArgMatches) -> ConverterOptions {
        let mut options = ConverterOptions::default();

        if let Some(patterns) = &self.config.skip_name_patterns {
            options.skip_name_patterns = patterns.clone();
        }
        if let Some(extension) = &self.config.markup_extension {
            options.markup_extension = extension.trim_start_matches('.').to_string();
        }
        if let Some(name) = &self.config.default_form_name {
            options.default_form_name = name.clone();
        }

        let flag = |id: &str| {
            matches
                .try_get_one::<bool>(id)
                .ok()
                .flatten()
                .copied()
                .unwrap_or(false)
        };
        options.debug_mode = flag("debug") || self.config.debug_mode.unwrap_or(false);

        if let Ok(Some(patterns)) = matches.try_get_many::<String>("skip") {
            options.skip_name_patterns.extend(patterns.cloned());
        }
        if let Ok(Some(name)) = matches.try_get_one::<String>("form-name") {
            options.default_form_name = name.clone();
        }
        options
    }

    fn output_directory(&self) -> Option<&str> {
        self.config.output_directory.as_deref()
    }
}
