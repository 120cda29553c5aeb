// src/cli.rs
use anyhow::{Context, Result};
use bytes::Bytes;
use clap::{Parser, Subcommand};
use futures_util::Stream;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::info;

use crate::client::{CommandSpeaker, Conversation, StreamConsumer, VokeClient};
use crate::config::AppConfig;
use crate::types::{ChatMessage, InterviewMode, SkillGaps};

const OPENING_MESSAGE: &str = "Start";
const QUIT_COMMANDS: [&str; 3] = ["/quit", "/exit", "/q"];

#[derive(Parser)]
#[command(name = "voke")]
#[command(about = "AI interview practice: HTTP server and terminal client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Base URL of a running server, used by the client commands
    #[arg(long, global = true, env = "VOKE_SERVER_URL", default_value = "http://localhost:8000")]
    pub server: String,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve,
    /// Practice an interview in the terminal
    Chat {
        /// general, technical, behavioral or resume
        #[arg(long = "type", default_value = "general")]
        interview_type: String,
        /// Plain-text resume embedded in resume interviews
        #[arg(long)]
        resume: Option<PathBuf>,
        /// Command that reads each answer aloud from stdin, e.g. "espeak"
        #[arg(long)]
        speak: Option<String>,
    },
    /// Practice an interview targeted at known skill gaps
    Adaptive {
        #[arg(long)]
        user: String,
        /// JSON file with the skill gaps (a list or any JSON document)
        #[arg(long)]
        skill_gaps: Option<PathBuf>,
        #[arg(long)]
        speak: Option<String>,
    },
    /// Research job-market trends for a category and print them
    Trends {
        #[arg(long)]
        category: String,
    },
}

/// Which endpoint a terminal interview talks to.
enum Interview {
    Standard {
        mode: InterviewMode,
        resume: Option<String>,
    },
    Adaptive {
        user_id: String,
        skill_gaps: Option<SkillGaps>,
    },
}

type BodyStream = Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>;

impl Interview {
    async fn open(&self, client: &VokeClient, messages: &[ChatMessage]) -> Result<BodyStream> {
        Ok(match self {
            Interview::Standard { mode, resume } => {
                Box::pin(client.interview_chat(messages, *mode, resume.as_deref()).await?)
            }
            Interview::Adaptive {
                user_id,
                skill_gaps,
            } => Box::pin(
                client
                    .adaptive_chat(messages, user_id, skill_gaps.as_ref())
                    .await?,
            ),
        })
    }
}

pub async fn handle_command(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Serve => {
            let config = AppConfig::load()?;
            crate::web::start_web_server(config).await
        }

        Command::Chat {
            interview_type,
            resume,
            speak,
        } => {
            let resume = match resume {
                Some(path) => Some(read_file(&path).await?),
                None => None,
            };
            let interview = Interview::Standard {
                mode: InterviewMode::parse(Some(&interview_type)),
                resume,
            };
            run_interview(&cli.server, interview, speak.as_deref()).await
        }

        Command::Adaptive {
            user,
            skill_gaps,
            speak,
        } => {
            let skill_gaps = match skill_gaps {
                Some(path) => {
                    let raw = read_file(&path).await?;
                    Some(
                        serde_json::from_str::<SkillGaps>(&raw)
                            .with_context(|| format!("Invalid skill gaps in {}", path.display()))?,
                    )
                }
                None => None,
            };
            if let Some(gaps) = skill_gaps.as_ref().and_then(SkillGaps::list) {
                let skills: Vec<_> = gaps.iter().map(|gap| gap.skill.as_str()).collect();
                println!("Targeting skill gaps: {}", skills.join(", "));
            }
            let interview = Interview::Adaptive {
                user_id: user,
                skill_gaps,
            };
            run_interview(&cli.server, interview, speak.as_deref()).await
        }

        Command::Trends { category } => {
            let client = VokeClient::new(&cli.server)?;
            let trends = client.research_trends(&category).await?;

            println!("✅ {} trends stored for '{}':", trends.len(), category);
            for trend in trends {
                println!();
                println!("## {} [{} demand, {}]", trend.title, trend.demand_level, trend.growth_rate);
                if !trend.description.is_empty() {
                    println!("   {}", trend.description);
                }
                if !trend.trending_skills.is_empty() {
                    println!("   Skills: {}", trend.trending_skills.join(", "));
                }
                if !trend.salary_range.is_empty() {
                    println!("   Salary: {}", trend.salary_range);
                }
                for tip in &trend.preparation_tips {
                    println!("   - {}", tip);
                }
            }
            Ok(())
        }
    }
}

async fn read_file(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

async fn run_interview(server: &str, interview: Interview, speak: Option<&str>) -> Result<()> {
    let client = VokeClient::new(server)?;
    let speaker = speak.map(CommandSpeaker::parse).transpose()?;
    let consumer = match &speaker {
        Some(speaker) => StreamConsumer::new().with_speaker(speaker),
        None => StreamConsumer::new(),
    };

    let mut conversation = Conversation::new();
    conversation.push(ChatMessage::user(OPENING_MESSAGE));

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    println!("Type your answer and press Enter. /quit ends the interview.\n");

    loop {
        let body = interview.open(&client, conversation.messages()).await?;

        let mut stdout = std::io::stdout();
        let outcome = consumer
            .consume(body, &mut conversation, |delta| {
                print!("{}", delta);
                let _ = stdout.flush();
            })
            .await?;
        println!("\n");

        if outcome.skipped_frames > 0 {
            info!("{} malformed frames were skipped", outcome.skipped_frames);
        }

        let Some(answer) = next_answer(&mut input).await? else {
            break;
        };
        conversation.push(ChatMessage::user(answer));
    }

    println!("Interview finished after {} messages.", conversation.messages().len());
    Ok(())
}

/// Prompts until the user types something. `None` on end of input or a quit command.
async fn next_answer<R>(input: &mut Lines<R>) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        print!("> ");
        std::io::stdout().flush().context("Failed to flush stdout")?;

        let Some(line) = input.next_line().await.context("Failed to read input")? else {
            return Ok(None);
        };
        let answer = line.trim();
        if QUIT_COMMANDS.contains(&answer) {
            return Ok(None);
        }
        if !answer.is_empty() {
            return Ok(Some(answer.to_string()));
        }
    }
}
