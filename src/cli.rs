use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(version, about = "Convert proxy share links into sing-box configs", long_about = None)]
pub struct Args {
    #[arg(short, long, global = true, help = "Emit debug log")]
    pub verbose: bool,

    #[arg(
        short,
        long,
        global = true,
        default_value = "~/.config/boxlink/boxlink.toml",
        help = "Settings file, defaults are used when it does not exist"
    )]
    pub config: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Convert share links and subscription URLs into a config
    Convert {
        #[arg(short, long, help = "File with one link or subscription URL per line, - for stdin")]
        input: Option<String>,

        #[arg(short, long, help = "Config output path, stdout when omitted")]
        output: Option<String>,

        #[arg(
            long,
            num_args = 0..=1,
            default_missing_value = "",
            value_name = "NAME",
            help = "Save the config under NAME, prompt for a name when NAME is omitted"
        )]
        save: Option<String>,
    },

    /// List saved configs
    List,

    /// Print or export a saved config
    Show {
        name: String,

        #[arg(short, long, help = "Config output path, stdout when omitted")]
        output: Option<String>,
    },

    /// Delete a saved config
    Delete { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_with_bare_save() {
        let args = Args::parse_from(["boxlink", "convert", "-i", "links.txt", "--save"]);
        let Command::Convert { input, save, output } = args.command else {
            panic!("Expected convert command");
        };
        assert_eq!(input.as_deref(), Some("links.txt"));
        assert_eq!(save.as_deref(), Some(""));
        assert!(output.is_none());
    }

    #[test]
    fn test_convert_with_named_save() {
        let args = Args::parse_from(["boxlink", "-v", "convert", "--save", "home"]);
        assert!(args.verbose);
        let Command::Convert { save, .. } = args.command else {
            panic!("Expected convert command");
        };
        assert_eq!(save.as_deref(), Some("home"));
    }

    #[test]
    fn test_show_with_global_config() {
        let args = Args::parse_from(["boxlink", "show", "home", "-c", "/tmp/b.toml"]);
        assert_eq!(args.config, "/tmp/b.toml");
        assert!(matches!(args.command, Command::Show { ref name, .. } if name == "home"));
    }
}
