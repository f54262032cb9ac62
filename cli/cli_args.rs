use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct ProjectConfigOpts {
    #[arg(
        long,
        help = "Directory that relative inputs and references resolve against (default: $FILEPROMPT_ROOT or current dir).",
        help_heading = "Project Setup",
        value_name = "PATH"
    )]
    pub working_dir: Option<PathBuf>,

    #[arg(
        long,
        help = "Specify path/filename of the TOML config file (default: .xtools/fileprompt/fileprompt.toml).",
        value_name = "CONFIG_FILE",
        conflicts_with = "no_config_file",
        help_heading = "Project Setup"
    )]
    pub config_file: Option<String>,

    #[arg(
        long,
        help = "Disable loading any TOML config file.",
        conflicts_with = "config_file",
        help_heading = "Project Setup"
    )]
    pub no_config_file: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterGroup {
    #[arg(long, value_name = "PATTERN", action = clap::ArgAction::Append, help = "Only emit files whose name or relative path matches a glob.", help_heading = "Content Filtering")]
    pub include: Vec<String>,
    #[arg(long, value_name = "PATTERN", action = clap::ArgAction::Append, help = "Drop files whose name or relative path matches a glob (wins over --include).", help_heading = "Content Filtering")]
    pub exclude: Vec<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct IgnoreTogglesGroup {
    #[arg(
        long,
        help = "Respect .gitignore files [default: enabled].",
        overrides_with = "no_gitignore",
        help_heading = "Ignore Rules"
    )]
    pub gitignore: bool,
    #[arg(
        long,
        help = "Do not respect .gitignore files.",
        overrides_with = "gitignore",
        help_heading = "Ignore Rules"
    )]
    pub no_gitignore: bool,

    #[arg(
        long,
        help = "Include files and directories whose name starts with a dot.",
        overrides_with = "ignore_hidden",
        help_heading = "Ignore Rules"
    )]
    pub show_hidden: bool,
    #[arg(
        long,
        help = "Skip files and directories whose name starts with a dot [default].",
        overrides_with = "show_hidden",
        help_heading = "Ignore Rules"
    )]
    pub ignore_hidden: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ResolveGroup {
    #[arg(short = 'i', long = "instruction-ext", value_name = "EXT", action = clap::ArgAction::Append, help = "Extension of files parsed for references (replaces the configured list) [default: txt].", help_heading = "Reference Following")]
    pub instruction_ext: Vec<String>,

    #[arg(short = 'p', long = "prefix-map", value_name = "PREFIX=PATH", action = clap::ArgAction::Append, help = "Map a symbolic path prefix to a directory; first matching entry wins (replaces the configured list) [default: google3=.].", help_heading = "Reference Following")]
    pub prefix_map: Vec<String>,

    #[arg(
        long,
        value_name = "N",
        help = "Maximum nesting of directories and references to follow [default: 64].",
        help_heading = "Reference Following"
    )]
    pub max_depth: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct CollectArgs {
    #[arg(
        required = true,
        value_name = "PATHS",
        help = "Files and directories to start from."
    )]
    pub paths: Vec<String>,

    #[clap(flatten)]
    pub project_config: ProjectConfigOpts,
    #[clap(flatten)]
    pub filters: FilterGroup,
    #[clap(flatten)]
    pub ignore_toggles: IgnoreTogglesGroup,
    #[clap(flatten)]
    pub resolve: ResolveGroup,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FormatOutputOpts {
    #[arg(short = 'f', long, help = "Set the output format.", value_name = "FORMAT", value_parser = ["text", "json", "yaml", "xml"], default_value = "text", help_heading = "Output Formatting")]
    pub format: String,

    #[arg(
        long,
        help = "Pretty-print JSON and XML output.",
        help_heading = "Output Formatting"
    )]
    pub pretty: bool,
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Bundle files, and the files they reference, into one prompt-ready report.",
    long_about = "fileprompt starts from the given paths, walks directories, and follows path \nreferences written inside instruction files (*.txt by default). The result is a \nsource tree plus the content of every collected file, as text or structured output.",
    help_template = "{about-section}\nUsage: {usage}\n\n{all-args}{after-help}",
    after_help = "EXAMPLES:\n  fileprompt generate src/ TODO.txt\n  fileprompt generate -p lib=./third_party notes.txt -f json -o context.json\n  fileprompt tree . --exclude '*.lock'",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = "Increase message verbosity (-v, -vv).")]
    pub verbose: u8,

    #[arg(
        short,
        long,
        global = true,
        help = "Silence informational messages and warnings."
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    #[command(
        visible_alias = "g",
        about = "Collect files and render the full report."
    )]
    Generate(GenerateArgs),

    #[command(visible_alias = "t", about = "Collect files and print only the source tree.")]
    Tree(TreeArgs),

    #[command(about = "Print a shell completion script.")]
    Completion(CompletionArgs),

    #[command(about = "Show or save the default configuration file.")]
    Config(ConfigArgs),
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    #[clap(flatten)]
    pub collect: CollectArgs,
    #[clap(flatten)]
    pub format_output: FormatOutputOpts,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write the report to FILE instead of standard output.",
        help_heading = "Output Control"
    )]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct TreeArgs {
    #[clap(flatten)]
    pub collect: CollectArgs,
}

#[derive(Args, Debug, Clone)]
pub struct CompletionArgs {
    #[arg(value_enum, value_name = "SHELL", help = "Shell to generate completions for.")]
    pub shell: Shell,
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(
        long,
        help = "Save the default config to .xtools/fileprompt/fileprompt.toml under the working directory."
    )]
    pub save: bool,

    #[arg(
        long,
        requires = "save",
        help = "Overwrite an existing config file when saving."
    )]
    pub force: bool,

    #[arg(long, value_name = "PATH", help = "Working directory to save into.")]
    pub working_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_generate_with_overrides() {
        let cli = Cli::try_parse_from([
            "fileprompt",
            "-vv",
            "g",
            "notes.txt",
            "src",
            "-p",
            "lib=./vendor",
            "-i",
            "md",
            "--no-gitignore",
            "--exclude",
            "*.lock",
            "-f",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Some(Commands::Generate(args)) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.collect.paths, vec!["notes.txt", "src"]);
        assert_eq!(args.collect.resolve.prefix_map, vec!["lib=./vendor"]);
        assert_eq!(args.collect.resolve.instruction_ext, vec!["md"]);
        assert!(args.collect.ignore_toggles.no_gitignore);
        assert_eq!(args.collect.filters.exclude, vec!["*.lock"]);
        assert_eq!(args.format_output.format, "json");
    }

    #[test]
    fn generate_requires_paths() {
        assert!(Cli::try_parse_from(["fileprompt", "generate"]).is_err());
    }

    #[test]
    fn format_defaults_to_text() {
        let cli = Cli::try_parse_from(["fileprompt", "generate", "."]).unwrap();
        let Some(Commands::Generate(args)) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.format_output.format, "text");
        assert!(!args.format_output.pretty);
    }
}
