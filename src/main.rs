use log::{error, info};
use std::env;
use std::process::ExitCode;
use survey_tally::db::{Database, SurveyStore};
use survey_tally::display::render_summary;
use survey_tally::editing::SurveyEdit;
use survey_tally::handlers::{SurveyService, VoteOutcome};
use survey_tally::{Config, Survey};

const USAGE: &str = "usage:
  survey-tally create <question> <option>...
  survey-tally list
  survey-tally vote <survey_id> <user_id|-> <option_number>
  survey-tally results <survey_id> [--json]
  survey-tally add-option <survey_id>
  survey-tally remove-option <survey_id> <option_number>";

type CliResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let database = match Database::new(&config).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let service = SurveyService::new(database, &config);

    let args: Vec<String> = env::args().skip(1).collect();
    match run(&service, &args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(service: &SurveyService<Database>, args: &[String]) -> CliResult {
    let Some((command, rest)) = args.split_first() else {
        println!("{USAGE}");
        return Ok(());
    };

    match (command.as_str(), rest) {
        ("create", [question, options @ ..]) => {
            let survey = Survey::new(question.clone(), options.to_vec());
            let created = service.create_survey(&survey).await?;
            info!("Created survey {}", created.value.id);
            println!("{}", created.value.id);
        }
        ("list", []) => {
            for survey in service.store().list_surveys().await? {
                println!("{}  {} ({} votes)", survey.value.id, survey.value.question, survey.value.votes.len());
            }
        }
        ("vote", [survey_id, user_id, option_number]) => {
            let survey = service.store().get_survey(survey_id).await?.value;
            let index = parse_option_number(option_number, survey.options.len())?;
            let user_id = (user_id != "-").then_some(user_id.as_str());

            match service.cast_vote(survey_id, user_id, &survey.options[index].id).await? {
                VoteOutcome::Recorded(_) => println!("Vote recorded."),
                VoteOutcome::Rejected(reason) => println!("Vote not recorded: {reason}"),
            }
        }
        ("results", [survey_id, flags @ ..]) => {
            let survey = service.store().get_survey(survey_id).await?.value;
            let results = survey_tally::get_survey_results(&survey);
            if flags.iter().any(|f| f == "--json") {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                println!("{}", render_summary(&survey, &results));
            }
        }
        ("add-option", [survey_id]) => {
            let updated = service.apply_edit(survey_id, &SurveyEdit::add_option()).await?;
            println!("{} options", updated.value.options.len());
        }
        ("remove-option", [survey_id, option_number]) => {
            let survey = service.store().get_survey(survey_id).await?.value;
            let index = parse_option_number(option_number, survey.options.len())?;
            let edit = SurveyEdit::RemoveOption {
                index,
                option_id: survey.options[index].id.clone(),
            };
            let updated = service.apply_edit(survey_id, &edit).await?;
            if updated.value.options.len() == survey.options.len() {
                println!("A survey needs at least one option.");
            } else {
                println!("{} options", updated.value.options.len());
            }
        }
        _ => {
            println!("{USAGE}");
        }
    }

    Ok(())
}

// Options are numbered from 1 on the command line
fn parse_option_number(value: &str, option_count: usize) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(n) if (1..=option_count).contains(&n) => Ok(n - 1),
        _ => Err(format!("option number must be between 1 and {option_count}, got {value:?}")),
    }
}
