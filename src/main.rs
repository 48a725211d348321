//! Datecourse CLI - date-course recommendations in the terminal
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments, wiring collaborators and handling top-level errors.

use clap::{Parser, Subcommand};
use colored::Colorize;
use datecourse::agent::GeminiAgent;
use datecourse::export::{self, CLOSING_NOTES, TIMELINE_TITLE};
use datecourse::scraper::PlaceScraper;
use datecourse::weather::OpenWeather;
use datecourse::{datetime, Config, Planner, PlannerOptions, Session, TurnOutcome};
use dialoguer::Input;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "datecourse")]
#[command(author, version, about = "Date-course recommendations with timelines", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat interactively, refining the course with feedback
    Chat,
    /// Plan a single course and print it
    Plan {
        /// What kind of date you want
        request: String,
        /// Also save the course to a file
        #[arg(long)]
        save: bool,
    },
    /// Show the date and start time inferred from a request
    When {
        request: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::When { request }) => {
            let plan = datetime::extract(&request);
            println!("📅 {}", plan.date.format("%Y-%m-%d"));
            println!("🕔 {}", plan.time.format("%H:%M"));
        }
        Some(Commands::Plan { request, save }) => {
            let config = Config::load()?;
            let planner = build_planner(&config)?;
            let mut session = Session::new();

            println!("{}", "코스를 준비하고 있어요...".dimmed());
            let outcome = planner.handle_turn(&mut session, &request).await?;
            print_outcome(&outcome);

            if save {
                let path = export::save_course(&config.export.dir, &session)?;
                println!("\n💾 {}", path.display().to_string().green());
            }
        }
        Some(Commands::Chat) | None => {
            let config = Config::load()?;
            let planner = build_planner(&config)?;
            chat(&planner, &config).await?;
        }
    }

    Ok(())
}

fn build_planner(config: &Config) -> anyhow::Result<Planner> {
    let generator = GeminiAgent::from_config(config)?;
    let weather = OpenWeather::new(config.weather_key()?, config.weather.clone())?;
    let ratings = PlaceScraper::new()?;

    Ok(Planner::new(
        Box::new(generator),
        Box::new(weather),
        Box::new(ratings),
        PlannerOptions::from_config(config),
    ))
}

async fn chat(planner: &Planner, config: &Config) -> anyhow::Result<()> {
    println!("{}", "🎈 데이트 코스 추천 챗봇".bold());
    println!("분위기, 시간/날짜, 지역, 데이트 스타일을 자유롭게 말씀해주세요!");
    println!(
        "{}",
        "/reset 다시 짜기 · /save 최종 코스 저장 · /transcript 대화 저장 · /quit 종료".dimmed()
    );

    let mut session = Session::new();
    loop {
        let line: String = Input::new()
            .with_prompt("👤")
            .allow_empty(true)
            .interact_text()?;
        let line = line.trim();

        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/reset" => {
                session.reset();
                println!("{}", "🔄 처음부터 다시 시작합니다.".yellow());
            }
            "/save" => match export::save_course(&config.export.dir, &session) {
                Ok(path) => println!("💾 {}", path.display().to_string().green()),
                Err(e) => eprintln!("{}", e.to_string().red()),
            },
            "/transcript" => {
                let content = export::transcript_document(&session);
                let path = export::save(&config.export.dir, &content, chrono::Local::now())?;
                println!("💾 {}", path.display().to_string().green());
            }
            request => match planner.handle_turn(&mut session, request).await {
                Ok(outcome) => print_outcome(&outcome),
                Err(e) => eprintln!("{} {}", "⚠️".red(), e.to_string().red()),
            },
        }
    }

    Ok(())
}

fn print_outcome(outcome: &TurnOutcome) {
    println!("\n{}", outcome.itinerary.text);
    println!("\n{}", TIMELINE_TITLE.bold());
    println!("{}", outcome.timeline_table());
    println!("\n{}", CLOSING_NOTES.dimmed());
}
