pub mod boot;
pub mod command;
pub mod parse;

use crate::shell::{
    boot::perform_disk_initialization, command::execute_command, parse::parse_command,
};
use block_fs::{
    config::{self, Config},
    FileDisk, FileSystem, FileSystemError,
};
use colored::*;
use crossterm::{
    cursor, execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use indicatif::{ProgressBar, ProgressStyle};
use reedline::{DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal};
use std::{io::stdout, sync::mpsc, thread};

/// 启动线程向 shell 汇报的进度
pub enum BootProgress {
    Step(&'static str),
    Progress(u64),
    Finished(Result<FileSystem<FileDisk>, FileSystemError>),
}

pub fn start_shell(config: Config) {
    let mut fs = match boot(&config) {
        Ok(fs) => fs,
        Err(e) => {
            println!("{} {}", "❌ Boot failed:".red().bold(), e);
            log::error!("boot failed: {}", e);
            std::process::exit(1);
        }
    };

    let username = whoami::username();
    let hostname = whoami::fallible::hostname().unwrap_or_else(|_| "localhost".to_string());

    println!(
        "{}",
        "Type 'help' for available commands. Use ↑↓ for history, Tab for auto-completion.\n"
            .bright_black()
    );

    let mut line_editor = Reedline::create();
    match FileBackedHistory::with_file(config::HISTORY_SIZE, config.history_path.clone()) {
        Ok(history) => line_editor = line_editor.with_history(Box::new(history)),
        Err(e) => log::warn!("history disabled: {}", e),
    }

    // 命令补全
    let commands = vec![
        "help", "ls", "create", "open", "close", "read", "write", "seek", "tell", "size", "cat",
        "rm", "stat", "format", "exit",
    ];
    let completer = reedline::DefaultCompleter::new_with_wordlen(
        commands.into_iter().map(String::from).collect(),
        2,
    );
    line_editor = line_editor.with_completer(Box::new(completer));

    let prompt = DefaultPrompt::new(
        DefaultPromptSegment::Basic(format!("{}@{}", username, hostname)),
        DefaultPromptSegment::Basic("BlockFS".to_string()),
    );

    loop {
        match line_editor.read_line(&prompt) {
            Ok(Signal::Success(buffer)) => {
                let trimmed = buffer.trim();
                if trimmed.is_empty() {
                    continue;
                }

                match parse_command(trimmed) {
                    Some(cmd) => {
                        if let Err(e) = execute_command(&cmd, &mut fs) {
                            report(&e, &config, &fs);
                        }
                        if matches!(cmd, command::Command::Exit) {
                            break;
                        }
                    }
                    None => println!(
                        "{}",
                        "⚠️  Unknown command or bad arguments. Type 'help' for command list."
                            .yellow()
                    ),
                }
            }
            Ok(Signal::CtrlC) => {
                println!();
                continue;
            }
            Ok(Signal::CtrlD) => {
                println!("{}", "Exiting BlockFS...".yellow());
                break;
            }
            Err(e) => {
                println!("Error reading line: {}", e);
                break;
            }
        }
    }

    if let Err(e) = fs.unmount() {
        println!("{} {}", "❌ Unmount failed:".red().bold(), e);
    }
    println!("{}", "GoodBye!".bright_yellow());
}

/// 误用类错误默认直接终止进程；`abort_on_misuse` 关闭时只报告
fn report(e: &FileSystemError, config: &Config, fs: &FileSystem<FileDisk>) {
    if e.is_fatal() && config.abort_on_misuse {
        println!("{} {}", "💥 Fatal:".red().bold(), e);
        log::error!("fatal error, aborting: {}", e);
        if let Err(sync_err) = fs.sync() {
            log::error!("final sync failed: {}", sync_err);
        }
        std::process::exit(1);
    }
    println!("{} {}", "❌ Error:".red().bold(), e);
}

fn boot(config: &Config) -> Result<FileSystem<FileDisk>, FileSystemError> {
    let mut stdout = stdout();
    let _ = execute!(stdout, Clear(ClearType::All), cursor::MoveTo(0, 0));
    println!("{}", "[BlockFS Booting...]".bright_yellow().bold());

    let pb = ProgressBar::new(100);
    if let Ok(style) = ProgressStyle::with_template("[{bar:40.cyan/blue}] {pos:>3}% {msg}") {
        pb.set_style(style.progress_chars("=> "));
    }

    let (tx, rx) = mpsc::channel();
    let disk_path = config.disk_path.clone();
    let worker = thread::spawn(move || perform_disk_initialization(tx, disk_path));

    let mut result = None;
    for progress in rx {
        match progress {
            BootProgress::Step(msg) => pb.set_message(msg),
            BootProgress::Progress(pos) => pb.set_position(pos),
            BootProgress::Finished(r) => {
                result = Some(r);
                break;
            }
        }
    }
    let _ = worker.join();

    let fs = result.unwrap_or_else(|| {
        Err(FileSystemError::Corrupted(
            "boot worker stopped without a result".to_string(),
        ))
    })?;
    pb.finish_with_message("✅ Ready!");

    let _ = execute!(
        stdout,
        SetForegroundColor(Color::Cyan),
        Print(format!(
            "Welcome to BlockFS v{} ({})\n",
            env!("CARGO_PKG_VERSION"),
            config.disk_path.display()
        )),
        ResetColor
    );
    Ok(fs)
}
