use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use question_bank_admin::error::AuthError;
use question_bank_admin::models::{AnswerDraft, QuestionStatus};
use question_bank_admin::utils::logging;
use question_bank_admin::utils::truncate_text;
use question_bank_admin::views::render_question_page;
use question_bank_admin::workflow::QuestionEditor;
use question_bank_admin::{
    ApiClient, AppError, AuthService, Config, DeleteOutcome, HttpQuestionSource, ListController,
    QuestionId, QuestionRepository, SessionStore, ViewState,
};

type Repository = QuestionRepository<HttpQuestionSource>;

#[derive(Parser)]
#[command(name = "qbadmin", about = "Administración del banco de preguntas")]
struct Cli {
    /// TOML 配置文件；不指定时只读取环境变量
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// 显示详细日志
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 登录（仅限管理员）
    Login {
        #[arg(short, long)]
        username: String,
        /// 不提供时从标准输入读取
        #[arg(short, long, env = "QB_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// 退出登录
    Logout,
    /// 显示当前登录用户
    Whoami,
    /// 列出一页题目
    List {
        #[arg(long)]
        page: Option<i64>,
        #[arg(long)]
        page_size: Option<u32>,
        #[arg(short, long)]
        search: Option<String>,
        /// 可分享的视图状态，例如 "page=2&pageSize=25&search=inca"
        #[arg(long)]
        query: Option<String>,
    },
    /// 显示一道题目
    Show { id: u64 },
    /// 创建题目
    Create {
        #[arg(short, long)]
        question: String,
        #[arg(short, long)]
        feedback: Option<String>,
        /// 答案，可重复
        #[arg(short, long = "answer")]
        answers: Vec<String>,
        /// 正确答案的序号（从 1 开始），默认第一个
        #[arg(long)]
        correct: Option<usize>,
    },
    /// 更新题目，未指定的字段保持不变
    Update {
        id: u64,
        #[arg(short, long)]
        question: Option<String>,
        #[arg(short, long)]
        feedback: Option<String>,
        /// AVAILABLE 或 DELETED
        #[arg(long)]
        status: Option<QuestionStatus>,
        /// 替换全部答案，可重复
        #[arg(short, long = "answer")]
        answers: Vec<String>,
        #[arg(long)]
        correct: Option<usize>,
    },
    /// 删除题目
    Delete {
        id: u64,
        /// 跳过确认
        #[arg(short, long)]
        yes: bool,
    },
    /// 交互式浏览（带防抖搜索）
    Browse {
        #[arg(long)]
        query: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("无法加载配置文件 {}", path.display()))?,
        None => Config::from_env(),
    };
    logging::init(cli.verbose || config.verbose_logging);

    let session = Arc::new(
        SessionStore::load(&config.session_file).context("无法读取会话文件")?,
    );
    let client = ApiClient::new(&config, session).context("无法创建 HTTP 客户端")?;
    let repo = QuestionRepository::new(HttpQuestionSource::new(client.clone(), &config), &config);
    let auth = AuthService::new(client).with_cache(repo.cache().clone());

    match cli.command {
        Command::Login { username, password } => {
            let password = match password {
                Some(password) => password,
                None => read_line("Contraseña: ").await?,
            };
            let user = auth.sign_in(&username, &password).await.map_err(with_hint)?;
            println!("Bienvenido, {} ({})", user.full_name, user.role);
        }
        Command::Logout => {
            auth.sign_out().await?;
            println!("Sesión cerrada");
        }
        Command::Whoami => match auth.current_user() {
            Some(user) => println!("{} <{}> · {}", user.username, user.email, user.role),
            None => println!("No has iniciado sesión"),
        },
        command => {
            auth.require_session().map_err(with_hint)?;
            run_authenticated(command, &repo, &config).await?;
        }
    }

    Ok(())
}

async fn run_authenticated(command: Command, repo: &Repository, config: &Config) -> Result<()> {
    match command {
        Command::List {
            page,
            page_size,
            search,
            query,
        } => {
            let mut view = query
                .as_deref()
                .map(ViewState::from_query)
                .unwrap_or_else(|| ViewState {
                    page_size: config.default_page_size,
                    ..ViewState::default()
                });
            if let Some(search) = search {
                view.search = search;
            }
            let mut controller = ListController::new(repo.clone(), view, config.search_debounce());
            if let Some(page_size) = page_size {
                controller.set_page_size(page_size)?;
            }
            if let Some(page) = page {
                controller.set_page(page)?;
            }
            let result = controller.next_page().await.map_err(with_hint)?;
            println!("{}", render_question_page(result));
            println!("\n?{}", controller.query_string());
        }
        Command::Show { id } => {
            let question = repo.find(QuestionId(id)).await.map_err(with_hint)?;
            println!("#{} [{}]", question.id, question.effective_status().label());
            println!("{}", question.question);
            if let Some(feedback) = &question.feedback {
                println!("💡 {}", feedback);
            }
            for (i, answer) in question.answers.iter().enumerate() {
                let marker = if answer.is_correct { "●" } else { "○" };
                println!("  {}. {} {}", i + 1, marker, answer.answer);
            }
        }
        Command::Create {
            question,
            feedback,
            answers,
            correct,
        } => {
            let mut editor = QuestionEditor::create();
            editor.question = question;
            editor.feedback = feedback.unwrap_or_default();
            apply_answers(&mut editor, answers, correct)?;
            editor.submit(repo).await.map_err(with_hint)?;
            println!("Pregunta creada correctamente");
        }
        Command::Update {
            id,
            question,
            feedback,
            status,
            answers,
            correct,
        } => {
            let existing = repo.find(QuestionId(id)).await.map_err(with_hint)?;
            let mut editor = QuestionEditor::edit(&existing);
            if let Some(question) = question {
                editor.question = question;
            }
            if let Some(feedback) = feedback {
                editor.feedback = feedback;
            }
            if let Some(status) = status {
                editor.set_status(status);
            }
            apply_answers(&mut editor, answers, correct)?;
            editor.submit(repo).await.map_err(with_hint)?;
            println!("Pregunta {} actualizada correctamente", id);
        }
        Command::Delete { id, yes } => {
            let id = QuestionId(id);
            if !yes {
                let question = repo.find(id).await.map_err(with_hint)?;
                let prompt = format!(
                    "¿Eliminar \"{}\"? (s/N): ",
                    truncate_text(&question.question, 60)
                );
                let answer = read_line(&prompt).await?;
                if !matches!(answer.trim(), "s" | "S" | "si" | "sí") {
                    println!("Cancelado");
                    return Ok(());
                }
            }
            match repo.delete(id).await.map_err(with_hint)? {
                DeleteOutcome::Deleted => println!("Pregunta {} eliminada", id),
                DeleteOutcome::AlreadyGone => println!("La pregunta {} ya no existía", id),
            }
        }
        Command::Browse { query } => {
            logging::log_startup(config);
            browse(repo, config, query.as_deref().unwrap_or_default()).await?;
        }
        Command::Login { .. } | Command::Logout | Command::Whoami => {}
    }
    Ok(())
}

/// 用命令行给出的答案替换编辑器中的答案，并选择正确答案
fn apply_answers(
    editor: &mut QuestionEditor,
    answers: Vec<String>,
    correct: Option<usize>,
) -> Result<()> {
    if !answers.is_empty() {
        editor.replace_answers(
            answers
                .into_iter()
                .map(|value| AnswerDraft::new(value, false))
                .collect(),
        );
    }
    if let Some(correct) = correct {
        if correct == 0 || !editor.answers_mut().select(correct - 1) {
            bail!(
                "--correct {} fuera de rango (1..={})",
                correct,
                editor.answers().len()
            );
        }
    }
    Ok(())
}

const BROWSE_HELP: &str =
    "n: siguiente · p: anterior · g N: ir a página · s N: tamaño · /texto: buscar · r: recargar · q: salir";

/// 交互式浏览：标准输入的每一行是一个命令，搜索词在静默期后才生效
async fn browse(repo: &Repository, config: &Config, query: &str) -> Result<()> {
    let mut controller = ListController::from_query(repo.clone(), query, config.search_debounce());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    show_page(&mut controller).await;
    println!("{}", BROWSE_HELP);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("无法读取标准输入")? else {
                    break;
                };
                let line = line.trim();
                let refetch = match line {
                    "q" => break,
                    "n" => controller.next(),
                    "p" => controller.prev(),
                    "r" => true,
                    "" | "h" | "?" => {
                        println!("{}", BROWSE_HELP);
                        false
                    }
                    _ if line.starts_with('/') => {
                        controller.search_input(&line[1..]);
                        println!("Buscando \"{}\"...", controller.displayed_search());
                        false
                    }
                    _ => match parse_numbered(line) {
                        Some(("g", page)) => report(controller.set_page(page)),
                        Some(("s", size)) => {
                            report(controller.set_page_size(u32::try_from(size).unwrap_or(0)))
                        }
                        _ => {
                            println!("Comando desconocido. {}", BROWSE_HELP);
                            false
                        }
                    },
                };
                if refetch {
                    show_page(&mut controller).await;
                }
            }
            changed = controller.wait_search() => {
                if changed {
                    show_page(&mut controller).await;
                }
            }
        }
    }

    info!("👋 浏览结束");
    Ok(())
}

async fn show_page(controller: &mut ListController<HttpQuestionSource>) {
    match controller.next_page().await {
        Ok(page) => println!("{}", render_question_page(page)),
        Err(e) => {
            warn!("⚠️ 列表加载失败: {}", e);
            println!("{} (r para reintentar)", e.user_message());
        }
    }
    println!("?{}", controller.query_string());
}

fn parse_numbered(line: &str) -> Option<(&str, i64)> {
    let (command, value) = line.split_once(' ')?;
    Some((command, value.trim().parse().ok()?))
}

/// 打印本地校验错误，返回是否需要重新获取
fn report(result: Result<(), AppError>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            println!("{}", e.user_message());
            false
        }
    }
}

/// 给错误加上下一步操作的提示
fn with_hint(err: AppError) -> anyhow::Error {
    let hint = match &err {
        AppError::Auth(AuthError::Unauthorized | AuthError::NotSignedIn) => {
            "Inicia sesión con `qbadmin login`"
        }
        AppError::Validation(_) => "Corrige los campos indicados",
        e if e.is_retryable() => "No se pudo completar la operación, inténtalo de nuevo",
        _ => return anyhow::Error::new(err),
    };
    anyhow::Error::new(err).context(hint)
}

async fn read_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    std::io::stdout().flush()?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let line = lines.next_line().await?.unwrap_or_default();
    Ok(line.trim_end().to_string())
}
