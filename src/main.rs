use clap::{Parser, Subcommand};
use newsletter_memory::config::MemoryConfig;
use newsletter_memory::error::{MemoryError, Result, ToolError};
use newsletter_memory::memory::{FactMemory, FactVerdict, StoreRecord, UrlMemory};
use newsletter_memory::status::StatusReport;
use newsletter_memory::tools::{ToolManager, ToolParameters};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "newsletter-memory")]
#[command(about = "Newsletter 防重复记忆：新闻 URL、技术工具、趣味事实")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// YAML 配置文件
    #[arg(long, global = true, env = "NEWSLETTER_MEMORY_CONFIG")]
    config: Option<PathBuf>,

    /// 覆盖配置中的记忆目录
    #[arg(long, global = true)]
    memory_dir: Option<PathBuf>,

    /// 输出 debug 日志
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 各存储的条目数和最近记录
    Status {
        #[arg(short, long, default_value_t = 3)]
        recent: usize,
    },
    /// 已使用的新闻文章
    News {
        #[command(subcommand)]
        action: NewsCommand,
    },
    /// 已介绍的技术工具
    Tools {
        #[command(subcommand)]
        action: ToolsCommand,
    },
    /// 已使用的趣味事实
    Facts {
        #[command(subcommand)]
        action: FactsCommand,
    },
    /// 以 Agent 工具的方式调用，输出与工具返回一致
    Tool {
        #[arg(required_unless_present = "schema")]
        name: Option<String>,

        /// JSON 对象形式的工具参数
        #[arg(long)]
        args: Option<String>,

        /// 打印全部工具定义（OpenAI tools 格式）
        #[arg(long, conflicts_with = "name")]
        schema: bool,
    },
}

#[derive(Subcommand)]
enum NewsCommand {
    Check {
        url: String,
        #[arg(short, long)]
        title: Option<String>,
    },
    Save {
        url: String,
        #[arg(short, long)]
        title: String,
    },
    List {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
}

#[derive(Subcommand)]
enum ToolsCommand {
    Check {
        url: String,
        #[arg(short, long)]
        name: Option<String>,
    },
    CheckName {
        name: String,
    },
    Save {
        url: String,
        #[arg(short, long)]
        name: String,
    },
    List {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
}

#[derive(Subcommand)]
enum FactsCommand {
    Check { text: String },
    Save { text: String },
    List {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("❌ {e}");
            exit_code_for(&e)
        }
    }
}

/// 输入有误返回 2，存储 / 配置错误返回 1
fn exit_code_for(err: &MemoryError) -> ExitCode {
    match err {
        MemoryError::Candidate(_)
        | MemoryError::Tool(
            ToolError::NotFound(_)
            | ToolError::MissingParameter(_)
            | ToolError::InvalidParameter { .. },
        ) => ExitCode::from(2),
        _ => ExitCode::FAILURE,
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = MemoryConfig::resolve(cli.config.as_deref())?;
    if let Some(dir) = cli.memory_dir {
        config = config.with_memory_dir(dir);
    }
    debug!(memory_dir = %config.memory_dir().display(), "⚙️ 配置已加载");

    match cli.command {
        Commands::Status { recent } => {
            let report = StatusReport::collect(&config, recent);
            print!("{report}");
            if report.has_errors() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::News { action } => run_news(&config, action)?,
        Commands::Tools { action } => run_tools(&config, action)?,
        Commands::Facts { action } => run_facts(&config, action)?,
        Commands::Tool { name, args, schema } => {
            return run_tool(&config, name.as_deref(), args.as_deref(), schema).await;
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn verdict_word(duplicate: bool) -> &'static str {
    if duplicate { "duplicate" } else { "new" }
}

fn print_recent<R: StoreRecord>(records: &[R]) {
    for record in records.iter().rev() {
        println!(
            "{}\t{}\t{}",
            record.saved_at().format("%Y-%m-%d"),
            record.label(),
            record.raw()
        );
    }
}

fn run_news(config: &MemoryConfig, action: NewsCommand) -> Result<()> {
    let news = UrlMemory::news(config);
    match action {
        NewsCommand::Check { url, title } => {
            println!("{}", verdict_word(news.check(&url, title.as_deref())?));
        }
        NewsCommand::Save { url, title } => {
            let record = news.save(&url, Some(&title), None)?;
            println!("saved\t{}", record.key);
        }
        NewsCommand::List { limit } => print_recent(&news.list_recent(limit)?),
    }
    Ok(())
}

fn run_tools(config: &MemoryConfig, action: ToolsCommand) -> Result<()> {
    let tools = UrlMemory::tools(config);
    match action {
        ToolsCommand::Check { url, name } => {
            println!("{}", verdict_word(tools.check(&url, name.as_deref())?));
        }
        ToolsCommand::CheckName { name } => {
            println!("{}", verdict_word(tools.check_secondary(&name)?));
        }
        ToolsCommand::Save { url, name } => {
            let record = tools.save(&url, Some(&name), None)?;
            println!("saved\t{}", record.key);
        }
        ToolsCommand::List { limit } => print_recent(&tools.list_recent(limit)?),
    }
    Ok(())
}

fn run_facts(config: &MemoryConfig, action: FactsCommand) -> Result<()> {
    let facts = FactMemory::new(config);
    match action {
        FactsCommand::Check { text } => {
            let verdict = facts.verdict(&text)?;
            if let FactVerdict::Similar { record, score } = &verdict {
                debug!(score, existing = %record.raw, "相似事实");
            }
            println!("{}", verdict_word(verdict.is_duplicate()));
        }
        FactsCommand::Save { text } => {
            let record = facts.save(&text)?;
            println!("saved\t{}", record.key);
        }
        FactsCommand::List { limit } => print_recent(&facts.list_recent(limit)?),
    }
    Ok(())
}

async fn run_tool(
    config: &MemoryConfig,
    name: Option<&str>,
    args: Option<&str>,
    schema: bool,
) -> Result<ExitCode> {
    let manager = ToolManager::with_newsletter_tools(config);
    if schema {
        let defs = serde_json::to_string_pretty(&manager.get_tool_definitions())?;
        println!("{defs}");
        return Ok(ExitCode::SUCCESS);
    }

    let name = name.ok_or_else(|| ToolError::MissingParameter("name".to_string()))?;
    let parameters: ToolParameters = match args {
        Some(raw) => serde_json::from_str(raw).map_err(|e| ToolError::InvalidParameter {
            name: "args".to_string(),
            message: e.to_string(),
        })?,
        None => ToolParameters::new(),
    };

    let result = manager.execute_tool(name, parameters).await?;
    if result.success {
        println!("{}", result.output);
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("❌ {}", result.error.unwrap_or_default());
        Ok(ExitCode::from(2))
    }
}
