use block_fs::fs::{SEEK_CUR, SEEK_END, SEEK_SET};

use crate::shell::command::Command;

fn parse_whence(token: &str) -> Option<i32> {
    match token {
        "set" => Some(SEEK_SET),
        "cur" => Some(SEEK_CUR),
        "end" => Some(SEEK_END),
        // 数字原样交给文件系统校验
        other => other.parse().ok(),
    }
}

pub fn parse_command(input: &str) -> Option<Command> {
    let tokens: Vec<&str> = input.split_ascii_whitespace().collect();
    let (&cmd, args) = tokens.split_first()?;

    let name = |i: usize| args.get(i).map(|s| s.to_string());
    let number = |i: usize| args.get(i).and_then(|s| s.parse::<usize>().ok());

    match cmd {
        "help" => Some(Command::Help),
        "ls" => Some(Command::Ls),
        "create" => name(0).map(Command::Create),
        "open" => name(0).map(Command::Open),
        "close" => number(0).map(Command::Close),
        "read" => Some(Command::Read(number(0)?, number(1)?)),
        "write" => {
            if args.len() >= 2 {
                Some(Command::Write(number(0)?, args[1..].join(" ")))
            } else {
                None
            }
        }
        "seek" => {
            let fd = number(0)?;
            let offset = args.get(1)?.parse::<i64>().ok()?;
            let whence = args.get(2).map_or(Some(SEEK_SET), |w| parse_whence(w))?;
            Some(Command::Seek(fd, offset, whence))
        }
        "tell" => number(0).map(Command::Tell),
        "size" => number(0).map(Command::Size),
        "cat" => name(0).map(Command::Cat),
        "rm" => name(0).map(Command::Rm),
        "stat" => name(0).map(Command::Stat),
        "format" => Some(Command::Format),
        "exit" => Some(Command::Exit),
        _ => None,
    }
}
