use advisor_core::types::{Audience, AvailableTime, Purpose, StressLevel};
use advisor_engine::Domain;
use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

#[derive(Parser, Debug)]
#[command(
    name = "advisor",
    version,
    about = "Prioritize insights and turn them into recommendations"
)]
pub struct AdvisorArgs {
    #[arg(
        short,
        long,
        global = true,
        value_name = "FILE",
        value_hint = ValueHint::FilePath,
        help = "YAML or JSON configuration file; domain defaults are used when omitted"
    )]
    pub config: Option<String>,

    #[arg(
        short,
        long,
        global = true,
        default_value_t = Domain::General,
        help = "Domain tuning: general, career, wellness or productivity"
    )]
    pub domain: Domain,

    #[arg(long, global = true, action = ArgAction::SetTrue, help = "Print results as JSON")]
    pub json: bool,

    #[arg(long, global = true, action = ArgAction::SetTrue, help = "Disable colored output")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl AdvisorArgs {
    /// Whether the selected subcommand asked for verbose output
    pub fn verbose(&self) -> bool {
        match &self.command {
            Commands::Prioritize(input) => input.verbose,
            Commands::Recommend(recommend) => recommend.input.verbose,
            Commands::Templates { .. } => false,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Score, filter and select the most valuable insights")]
    Prioritize(InsightArgs),
    #[command(about = "Generate recommendations from insights")]
    Recommend(RecommendArgs),
    #[command(about = "Inspect the template registry for a domain")]
    Templates {
        #[command(subcommand)]
        action: TemplateAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum TemplateAction {
    #[command(about = "List registered templates")]
    List,
    #[command(about = "Show one template")]
    Show {
        #[arg(value_name = "ID")]
        id: String,
    },
}

#[derive(Args, Debug)]
pub struct InsightArgs {
    #[arg(
        short,
        long,
        value_name = "FILE",
        value_hint = ValueHint::FilePath,
        help = "JSON file holding an array of insights"
    )]
    pub insights: String,

    #[arg(long, default_value_t = Purpose::DailyReview, help = "Purpose of the analysis")]
    pub purpose: Purpose,

    #[arg(long, default_value_t = Audience::Personal, help = "Audience: self, team or manager")]
    pub audience: Audience,

    #[arg(long, value_name = "LEVEL", help = "Current stress level: low, moderate or high")]
    pub stress: Option<StressLevel>,

    #[arg(
        long = "available-time",
        value_name = "AMOUNT",
        help = "Time available: minimal, limited, moderate or abundant"
    )]
    pub available_time: Option<AvailableTime>,

    #[arg(short, long, value_name = "N", help = "Upper bound on selected items")]
    pub max: Option<usize>,

    #[arg(short, long, action = ArgAction::SetTrue, help = "Show per-item details")]
    pub verbose: bool,
}

#[derive(Args, Debug)]
pub struct RecommendArgs {
    #[command(flatten)]
    pub input: InsightArgs,

    #[arg(
        long = "ai-command",
        value_name = "PROGRAM",
        help = "External program that reads a prompt on stdin and writes a completion to stdout"
    )]
    pub ai_command: Option<String>,

    #[arg(
        long = "ai-arg",
        value_name = "ARG",
        requires = "ai_command",
        allow_hyphen_values = true,
        help = "Argument passed to the AI program; may be repeated"
    )]
    pub ai_args: Vec<String>,

    #[arg(long = "no-fallback", action = ArgAction::SetTrue, help = "Do not fall back to templates when AI generation fails")]
    pub no_fallback: bool,

    #[arg(long = "deadline-ms", value_name = "MS", help = "Overall deadline for AI completions")]
    pub deadline_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_recommend() {
        let args = AdvisorArgs::try_parse_from([
            "advisor",
            "recommend",
            "--insights",
            "notes.json",
            "--purpose",
            "weekly-summary",
            "--audience",
            "team",
            "--stress",
            "high",
            "--ai-command",
            "llm",
            "--ai-arg",
            "--quiet",
            "--domain",
            "career",
            "--json",
        ])
        .unwrap();

        assert_eq!(args.domain, Domain::Career);
        assert!(args.json);
        match args.command {
            Commands::Recommend(recommend) => {
                assert_eq!(recommend.input.insights, "notes.json");
                assert_eq!(recommend.input.purpose, Purpose::WeeklySummary);
                assert_eq!(recommend.input.audience, Audience::Team);
                assert_eq!(recommend.input.stress, Some(StressLevel::High));
                assert_eq!(recommend.ai_command.as_deref(), Some("llm"));
                assert_eq!(recommend.ai_args, vec!["--quiet".to_string()]);
                assert!(!recommend.no_fallback);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_defaults_and_templates_show() {
        let args = AdvisorArgs::try_parse_from(["advisor", "templates", "show", "goal-set-intention"])
            .unwrap();
        assert_eq!(args.domain, Domain::General);
        assert!(args.config.is_none());
        assert!(matches!(
            args.command,
            Commands::Templates { action: TemplateAction::Show { ref id } } if id == "goal-set-intention"
        ));
    }

    #[test]
    fn test_audience_self_alias() {
        let args =
            AdvisorArgs::try_parse_from(["advisor", "prioritize", "-i", "x.json", "--audience", "self"])
                .unwrap();
        match args.command {
            Commands::Prioritize(input) => assert_eq!(input.audience, Audience::Personal),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_missing_insights_is_an_error() {
        assert!(AdvisorArgs::try_parse_from(["advisor", "prioritize"]).is_err());
        assert!(AdvisorArgs::try_parse_from(["advisor", "recommend", "-i", "x", "--ai-arg", "q"]).is_err());
    }
}
