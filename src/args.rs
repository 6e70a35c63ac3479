//! Command-line argument parsing for the speech-stream demo.

use std::env;
use std::path::PathBuf;

/// Parsed command-line arguments.
///
/// Options left at `None` fall back to the configuration file, then to the
/// built-in defaults.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Text to speak
    pub text: Option<String>,
    /// Output sample rate in Hz
    pub output_rate: Option<u32>,
    /// Output channel count
    pub channels: Option<u16>,
    /// Disable audio output
    pub no_play: bool,
    /// Simulated generation delay in ms per character
    pub delay_ms: Option<u64>,
    /// Playback idle timeout in ms
    pub idle_timeout_ms: Option<u64>,
    /// Sample rate of the demo tone engine
    pub engine_rate: Option<u32>,
    /// JSON pipeline configuration
    pub config_path: Option<PathBuf>,
    /// Also write the synthesized speech to this WAV file
    pub save_path: Option<PathBuf>,
    /// Whether help was requested
    pub show_help: bool,
}

impl CliArgs {
    /// Parse arguments from command line.
    pub fn parse() -> Self {
        Self::parse_from(env::args().skip(1))
    }

    /// Parse arguments from an iterator (program name excluded).
    pub fn parse_from<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = Self::default();
        let mut iter = iter.into_iter();

        while let Some(arg) = iter.next() {
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) if flag.starts_with("--") => (flag.to_string(), Some(value.to_string())),
                _ => (arg.clone(), None),
            };

            match flag.as_str() {
                "--help" | "-h" => args.show_help = true,
                "--no-play" => args.no_play = true,
                "-p" | "--text" => args.text = args.value(&flag, inline, &mut iter),
                "--config" => args.config_path = args.value(&flag, inline, &mut iter).map(PathBuf::from),
                "--save" => args.save_path = args.value(&flag, inline, &mut iter).map(PathBuf::from),
                "--output-rate" => args.output_rate = args.number(&flag, inline, &mut iter),
                "--channels" => args.channels = args.number(&flag, inline, &mut iter),
                "--delay" => args.delay_ms = args.number(&flag, inline, &mut iter),
                "--idle-timeout" => args.idle_timeout_ms = args.number(&flag, inline, &mut iter),
                "--engine-rate" => args.engine_rate = args.number(&flag, inline, &mut iter),
                _ if arg.starts_with('-') => {
                    eprintln!("Unknown flag: {}", arg);
                    args.show_help = true;
                }
                _ => {
                    eprintln!("Unexpected argument: {} (use -p to pass text)", arg);
                    args.show_help = true;
                }
            }
        }

        args
    }

    fn value(
        &mut self,
        flag: &str,
        inline: Option<String>,
        iter: &mut impl Iterator<Item = String>,
    ) -> Option<String> {
        let value = inline.or_else(|| iter.next());
        if value.is_none() {
            eprintln!("{} requires an argument", flag);
            self.show_help = true;
        }
        value
    }

    fn number<T: std::str::FromStr>(
        &mut self,
        flag: &str,
        inline: Option<String>,
        iter: &mut impl Iterator<Item = String>,
    ) -> Option<T> {
        let value = self.value(flag, inline, iter)?;
        match value.parse() {
            Ok(number) => Some(number),
            Err(_) => {
                eprintln!("Invalid value for {}: {}", flag, value);
                self.show_help = true;
                None
            }
        }
    }

    /// Print help text to stderr.
    pub fn print_help() {
        eprintln!(
            "Usage:\n  speech-stream [options]\n\n\
             Options:\n\
             \x20 -p, --text <text>        Text to speak (default: built-in mixed Chinese/English passage)\n\
             \x20 --output-rate <hz>       Output sample rate (default: 48000)\n\
             \x20 --channels <1|2>         Output channels, 2 duplicates mono (default: 1)\n\
             \x20 --no-play                Drain audio without playing it\n\
             \x20 --delay <ms>             Simulated generation delay per character (default: 5)\n\
             \x20 --idle-timeout <ms>      Playback idle timeout (default: 10000)\n\
             \x20 --engine-rate <hz>       Sample rate of the demo tone engine (default: 22050)\n\
             \x20 --config <file.json>     Load pipeline configuration from JSON\n\
             \x20 --save <file.wav>        Also write the streamed speech to WAV while it plays\n\
             \x20 -h, --help               Show this help\n\n\
             Logging:\n\
             \x20 RUST_LOG controls verbosity (default: info)\n\n\
             Examples:\n\
             \x20 speech-stream -p \"你好。World!\"\n\
             \x20 speech-stream --channels 2 --output-rate 44100\n\
             \x20 speech-stream --no-play --save out.wav\n"
        );
    }
}
