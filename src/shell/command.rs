use block_fs::{
    fs::{config::MAX_FILE_SIZE, FileStat, SEEK_END},
    Fd, FileDisk, FileSystem, Result,
};
use chrono::{DateTime, Local};
use colored::*;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Debug)]
pub enum Command {
    Help,
    Ls,
    Create(String),
    Open(String),
    Close(usize),
    Read(usize, usize),
    Write(usize, String),
    Seek(usize, i64, i32),
    Tell(usize),
    Size(usize),
    Cat(String),
    Rm(String),
    Stat(String),
    Format,
    Exit,
}

pub fn execute_command(cmd: &Command, fs: &mut FileSystem<FileDisk>) -> Result<()> {
    match cmd {
        Command::Help => print_help(),
        Command::Ls => {
            let names = fs.list_dir();
            if names.is_empty() {
                println!("{}", "(empty)".bright_black());
            }
            for name in names {
                let size = fs.stat(&name)?.size;
                println!("📄  {:<32} {:>8} B", name, size);
            }
        }
        Command::Create(name) => {
            let fd = fs.create(name)?;
            println!("📝 Created {} on fd {}", name.green(), fd.to_string().cyan());
        }
        Command::Open(name) => {
            let fd = fs.open(name)?;
            println!("📂 Opened {} on fd {}", name.green(), fd.to_string().cyan());
        }
        Command::Close(fd) => {
            fs.close(Fd::from_raw(*fd))?;
            println!("🔒 Closed fd {}", fd);
        }
        Command::Read(fd, numb) => {
            // 超过单个文件上限的部分不可能读到
            let mut buf = vec![0u8; (*numb).min(MAX_FILE_SIZE as usize)];
            let n = fs.read(Fd::from_raw(*fd), &mut buf)?;
            println!("📖 {} bytes read", n.to_string().cyan());
            println!("{}", String::from_utf8_lossy(&buf[..n]));
        }
        Command::Write(fd, text) => {
            let n = fs.write(Fd::from_raw(*fd), text.as_bytes())?;
            println!("✏️  {} bytes written", n.to_string().cyan());
        }
        Command::Seek(fd, offset, whence) => {
            let cursor = fs.seek_raw(Fd::from_raw(*fd), *offset, *whence)?;
            let from = if *whence == SEEK_END { " (from end)" } else { "" };
            println!("📍 Cursor at {}{}", cursor.to_string().cyan(), from);
        }
        Command::Tell(fd) => println!("📍 {}", fs.tell(Fd::from_raw(*fd))?),
        Command::Size(fd) => println!("📏 {} bytes", fs.size(Fd::from_raw(*fd))?),
        Command::Cat(name) => {
            let content = fs.read_all(name)?;
            println!("{}", String::from_utf8_lossy(&content));
        }
        Command::Rm(name) => {
            fs.remove(name)?;
            println!("❌ Deleted file: {}", name.red());
        }
        Command::Stat(name) => print_stat(&fs.stat(name)?),
        Command::Format => format(fs)?,
        Command::Exit => println!("{}", "👋 Exiting BlockFS shell...".yellow().bold()),
    }

    Ok(())
}

fn format(fs: &mut FileSystem<FileDisk>) -> Result<()> {
    let confirmed = Confirm::new()
        .with_prompt("Erase every file on the virtual disk?")
        .default(false)
        .interact()
        .unwrap_or(false);
    if !confirmed {
        println!("{}", "Format cancelled.".bright_black());
        return Ok(());
    }

    println!("💾 Formatting virtual disk...");
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message("writing metadata");
    fs.reformat()?;
    pb.finish_with_message("✅ Disk formatted successfully!");
    Ok(())
}

fn format_time(secs: u64) -> String {
    DateTime::from_timestamp(secs as i64, 0)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| secs.to_string())
}

fn print_stat(st: &FileStat) {
    println!("{}", "📊 File Info".bright_yellow().bold());
    println!("{}: {}", "Name".blue(), st.name);
    println!("{}: {} ({})", "Inode".blue(), st.inode, st.id.bright_black());
    println!("{}: {} bytes in {} blocks", "Size".blue(), st.size, st.blocks);
    println!("{}: {}", "Open".blue(), if st.open { "yes" } else { "no" });
    println!("{}: {}", "Accessed".blue(), format_time(st.atime));
    println!("{}: {}", "Modified".blue(), format_time(st.mtime));
    println!("{}: {}", "Changed".blue(), format_time(st.ctime));
}

fn print_help() {
    println!("{}", "📘 BlockFS Commands".bright_cyan().bold());
    println!(
        "{}",
        "
  ls                          List files
  create <file>               Create (or truncate) a file and open it
  open <file>                 Open an existing file
  close <fd>                  Close a file descriptor
  read <fd> <n>               Read up to n bytes at the cursor
  write <fd> <text>           Write text at the cursor
  seek <fd> <off> [set|cur|end]  Move the cursor
  tell <fd>                   Show the cursor
  size <fd>                   Show the file size
  cat <file>                  Print a whole file
  rm <file>                   Remove a closed file
  stat <file>                 Show file info
  format                      Erase the virtual disk
  help                        Show this help message
  exit                        Quit the shell
"
        .bright_black()
    );
}
