//! CLI Module
//!
//! Command-line interface for Truechart using Clap v4. The `session` command
//! is the composition root's driver: it wires the HTTP backend into a
//! [`WizardApp`](crate::app::WizardApp) and maps terminal input onto the
//! wizard's typed methods.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::sync::Arc;

use crate::api::{ChartKind, HttpBackend};
use crate::app::WizardApp;
use crate::chat::{render_assistant_content, EntryKind, MessageSegment};
use crate::wizard::ChartInput;

/// Truechart - Chat-guided birth-chart verification wizard
#[derive(Parser, Debug)]
#[command(name = "truechart")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug mode (creates log files in .truechart/logs/)
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive verification session (default)
    Session {
        /// User identifier sent with every backend request
        #[arg(short, long, env = "TRUECHART_USER_ID")]
        user_id: Option<String>,
    },

    /// Initialize configuration
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show configuration
    Config,
}

/// Main CLI entry point
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        None | Some(Commands::Session { .. }) => {
            let user_id = match &cli.command {
                Some(Commands::Session { user_id }) => user_id.clone(),
                _ => None,
            };
            cmd_session(&config, user_id).await
        }
        Some(Commands::Init { force }) => cmd_init(force),
        Some(Commands::Config) => cmd_config(&config),
    }
}

/// Load configuration from file or defaults
fn load_config(config_path: Option<&str>) -> Result<crate::config::Config> {
    use crate::config::Config;

    let config = if let Some(path) = config_path {
        tracing::info!("Loading configuration from custom path: {}", path);
        Config::load_from_path(path)?
    } else {
        tracing::debug!("Loading default configuration");
        Config::load()?
    };

    config.validate()?;
    Ok(config)
}

/// Initialize configuration file
fn cmd_init(force: bool) -> Result<()> {
    use crate::config::Config;

    let config_path = Config::default_path().context("Could not determine config directory")?;

    if config_path.exists() && !force {
        anyhow::bail!(
            "Configuration file already exists at: {}\nUse --force to overwrite",
            config_path.display()
        );
    }

    let default_config = Config::default();
    default_config.save(&config_path)?;

    println!("Configuration initialized at: {}", config_path.display());
    println!("\nNext steps:");
    println!("   1. Edit the config file to point backend.base_url at your service");
    println!("   2. Set user.user_id (or pass --user-id)");
    println!("   3. Run 'truechart session' to start");

    Ok(())
}

/// Show configuration
fn cmd_config(config: &crate::config::Config) -> Result<()> {
    println!("Truechart Configuration\n");
    println!("Backend:  {}", config.backend.base_url);
    println!(
        "Timeouts: {}s total, {}s connect",
        config.backend.timeout_secs, config.backend.connect_timeout_secs
    );
    println!(
        "User ID:  {}",
        config.user.user_id.as_deref().unwrap_or("[NOT SET]")
    );
    println!("Log level: {}", config.logging.level);
    Ok(())
}

/// Run the interactive session loop
async fn cmd_session(config: &crate::config::Config, user_id: Option<String>) -> Result<()> {
    let user_id = user_id
        .or_else(|| config.user.user_id.clone())
        .context("No user id. Pass --user-id, set TRUECHART_USER_ID, or configure user.user_id")?;

    let backend =
        HttpBackend::from_config(&config.backend).context("Failed to build backend client")?;
    let mut app = WizardApp::new(Arc::new(backend), user_id);

    println!("真命盘验证中心");
    println!("命令: /bazi <文件> | /ziwei <文件> | /text <bazi|ziwei> <内容> | /group <1-3>");
    println!("      /status | /templates | /template <id> | /upsop <文件> | /modeb | /quit");
    println!("其他输入会发送给 AI 伙伴。\n");

    let mut shown = 0usize;
    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line == "/quit" || line == "/exit" {
            break;
        } else if let Some(rest) = line.strip_prefix("/bazi ") {
            upload_file(&mut app, rest.trim(), ChartKind::Bazi).await;
        } else if let Some(rest) = line.strip_prefix("/ziwei ") {
            upload_file(&mut app, rest.trim(), ChartKind::Ziwei).await;
        } else if let Some(rest) = line.strip_prefix("/text ") {
            if let Some((kind, text)) = parse_kind_arg(rest) {
                app.on_upload(ChartInput::Text(text.to_string()), kind).await;
            } else {
                println!("用法: /text <bazi|ziwei> <内容>");
            }
        } else if let Some(rest) = line.strip_prefix("/group ") {
            match rest.trim().parse::<usize>() {
                Ok(n) if n >= 1 => {
                    if !app.on_switch(n - 1) {
                        println!("组号超出范围（1-3）");
                    }
                }
                _ => println!("用法: /group <1-3>"),
            }
        } else if line == "/status" {
            print_status(&app);
        } else if line == "/templates" {
            for template in app.modeb_templates().await {
                println!("  {} - {}", template.id, template.name);
            }
        } else if let Some(rest) = line.strip_prefix("/template ") {
            app.modeb_select_template(rest.trim());
            println!("按钮状态: {}", app.modeb_readiness().label());
        } else if let Some(rest) = line.strip_prefix("/upsop ") {
            let path = rest.trim();
            match std::fs::read(path) {
                Ok(bytes) => {
                    let name = std::path::Path::new(path)
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| path.to_string());
                    app.modeb_upload_template(name, bytes).await;
                }
                Err(err) => println!("读取文件失败: {err}"),
            }
        } else if line == "/modeb" {
            if let Some(ack) = app.on_modeb_run().await
                && let Some(score) = ack.data.consistency_score
            {
                println!("一致性评分: {score:.0}/100");
            }
        } else {
            app.on_chat(line).await;
        }

        shown = print_new_entries(&app, shown);
    }

    println!("\n再见！");
    Ok(())
}

async fn upload_file(app: &mut WizardApp, path: &str, kind: ChartKind) {
    match ChartInput::from_path(std::path::Path::new(path)) {
        Ok(input) => app.on_upload(input, kind).await,
        Err(err) => println!("读取文件失败: {err}"),
    }
}

fn parse_kind_arg(rest: &str) -> Option<(ChartKind, &str)> {
    let rest = rest.trim();
    if let Some(text) = rest.strip_prefix("bazi ") {
        Some((ChartKind::Bazi, text.trim()))
    } else if let Some(text) = rest.strip_prefix("ziwei ") {
        Some((ChartKind::Ziwei, text.trim()))
    } else {
        None
    }
}

fn print_status(app: &WizardApp) {
    let slot = app.store().current();
    println!("当前组: {}", app.store().active_index() + 1);
    println!("阶段: {:?}", app.conversation_state());
    for kind in ChartKind::ALL {
        let entry = slot.entry(kind);
        let confidence = entry
            .result
            .as_ref()
            .and_then(|r| r.confidence())
            .map(|c| format!("，置信度: {c}"))
            .unwrap_or_default();
        println!(
            "{}: {}{}",
            kind.display_name(),
            if entry.uploaded { "已验证" } else { "未上传" },
            confidence
        );
        for validation in &entry.validations {
            println!("  【验证结果】{} (置信度: {})", validation.summary, validation.confidence.display());
        }
    }
    println!("锁定: {}", if app.locked() { "已确认真命盘" } else { "未锁定" });
    println!("Mode B: {}", app.modeb_readiness().label());
}

/// Print transcript entries appended since the last call; returns the new
/// watermark.
fn print_new_entries(app: &WizardApp, shown: usize) -> usize {
    let entries = app.chat().transcript().entries();
    for entry in &entries[shown.min(entries.len())..] {
        match &entry.kind {
            EntryKind::User(text) => println!("👤 {text}"),
            EntryKind::Assistant { ai_name, content } => {
                let name = ai_name.as_deref().unwrap_or("灵伴");
                let rendered = render_assistant_content(content, app.locked());
                let mut line = String::new();
                for segment in rendered {
                    match segment {
                        MessageSegment::Text(text) => line.push_str(&text),
                        MessageSegment::Affirm { statement_id } => {
                            line.push_str(&format!("[准 → #yes-{statement_id}]"));
                        }
                        MessageSegment::Deny { statement_id } => {
                            line.push_str(&format!("[不准 → #no-{statement_id}]"));
                        }
                    }
                }
                println!("🤖 {name}: {line}");
            }
            EntryKind::Note(text) => println!("ℹ️  {text}"),
            EntryKind::Thinking => {}
        }
    }
    entries.len()
}
