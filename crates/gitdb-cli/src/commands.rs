use std::fs;
use std::io::{self, Read, Write};

use anyhow::Context;
use colored::Colorize;
use gitdb::{Engine, RevisionId};

use crate::cli::*;

pub fn run_command(engine: &Engine, command: Command) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_command_to(engine, command, &mut out)
}

pub fn run_command_to(engine: &Engine, command: Command, out: &mut dyn Write) -> anyhow::Result<()> {
    match command {
        Command::Init => cmd_init(engine, out),
        Command::Save(args) => cmd_save(engine, args, out),
        Command::Read(args) => cmd_read(engine, args, out),
        Command::Version => {
            writeln!(out, "{}", engine.version_string())?;
            Ok(())
        }
        Command::Log(args) => cmd_log(engine, args, out),
        Command::Verify => cmd_verify(engine, out),
        Command::Files => {
            for path in engine.files()? {
                writeln!(out, "{path}")?;
            }
            Ok(())
        }
    }
}

fn cmd_init(engine: &Engine, out: &mut dyn Write) -> anyhow::Result<()> {
    let root = engine.root().unwrap_or_default();
    writeln!(out, "{} Store ready in {}", "✓".green().bold(), root.display().to_string().bold())?;
    match engine.version() {
        Some(head) => writeln!(out, "  Head: {}", head.to_hex().yellow())?,
        None => writeln!(out, "  Head: {}", "(no revisions)".dimmed())?,
    }
    Ok(())
}

fn cmd_save(engine: &Engine, args: SaveArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let data = match (args.data, &args.from) {
        (Some(data), _) => data.into_bytes(),
        (None, Some(file)) => {
            fs::read(file).with_context(|| format!("reading {}", file.display()))?
        }
        (None, None) => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf).context("reading stdin")?;
            buf
        }
    };

    let id = engine.save_with_message(&args.path, &data, &args.message)?;
    writeln!(
        out,
        "{} Saved {} ({} bytes)",
        "✓".green().bold(),
        args.path.bold(),
        data.len()
    )?;
    writeln!(out, "  Revision: {}", id.to_hex().yellow())?;
    Ok(())
}

fn cmd_read(engine: &Engine, args: ReadArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let data = match &args.at {
        Some(rev) => {
            let id: RevisionId = rev
                .parse()
                .with_context(|| format!("invalid revision id {rev:?}"))?;
            engine.read_at(&id, &args.path)?
        }
        None => engine.read(&args.path)?,
    };
    out.write_all(&data)?;
    Ok(())
}

fn cmd_log(engine: &Engine, args: LogArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let revisions = engine.log(args.limit)?;
    if revisions.is_empty() {
        writeln!(out, "No revisions.")?;
        return Ok(());
    }

    for revision in revisions {
        if args.oneline {
            writeln!(out, "{} {}", revision.id.short_hex().yellow(), revision.message)?;
            continue;
        }
        writeln!(out, "{} {}", "revision".yellow(), revision.id.to_hex().yellow().bold())?;
        if let Some(parent) = revision.parent {
            writeln!(out, "Parent: {}", parent.short_hex().dimmed())?;
        }
        writeln!(out, "Author: {} <{}>", revision.author.name, revision.author.email)?;
        writeln!(out, "Date:   {}", revision.timestamp().to_rfc3339())?;
        writeln!(out, "\n    {}\n", revision.message)?;
    }
    Ok(())
}

fn cmd_verify(engine: &Engine, out: &mut dyn Write) -> anyhow::Result<()> {
    let report = engine.verify()?;
    if report.is_valid() {
        writeln!(out, "{} History integrity verified", "✓".green().bold())?;
        writeln!(out, "  Revisions: {}", report.revision_count.to_string().bold())?;
        writeln!(out, "  Objects: {}", report.objects_checked.to_string().bold())?;
        return Ok(());
    }

    writeln!(out, "{} History integrity check failed", "✗".red().bold())?;
    for violation in &report.violations {
        let revision = violation
            .revision
            .map_or_else(|| "-".to_string(), |id| id.short_hex());
        writeln!(
            out,
            "  {} {:?}: {}",
            revision.yellow(),
            violation.kind,
            violation.description
        )?;
    }
    anyhow::bail!("{} integrity violation(s)", report.violations.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_in(dir: &tempfile::TempDir) -> Engine {
        colored::control::set_override(false);
        let engine = Engine::new();
        engine.open(dir.path()).unwrap();
        engine
    }

    fn run(engine: &Engine, command: Command) -> String {
        let mut out = Vec::new();
        run_command_to(engine, command, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn save(engine: &Engine, path: &str, data: &str, message: &str) -> String {
        run(
            engine,
            Command::Save(SaveArgs {
                path: path.into(),
                from: None,
                data: Some(data.into()),
                message: message.into(),
            }),
        )
    }

    #[test]
    fn version_of_empty_store_is_error_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_in(&dir);
        assert_eq!(run(&engine, Command::Version), "error\n");
        assert!(run(&engine, Command::Init).contains("(no revisions)"));
    }

    #[test]
    fn save_then_read_and_version() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_in(&dir);
        let saved = save(&engine, "a/b.txt", "hello", "");
        assert!(saved.contains("Saved a/b.txt (5 bytes)"));

        let head = engine.version().unwrap();
        assert_eq!(run(&engine, Command::Version), format!("{}\n", head.to_hex()));
        let read = run(
            &engine,
            Command::Read(ReadArgs { path: "a/b.txt".into(), at: None }),
        );
        assert_eq!(read, "hello");
        assert_eq!(run(&engine, Command::Files), "a/b.txt\n");
    }

    #[test]
    fn read_at_earlier_revision() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_in(&dir);
        save(&engine, "k", "v1", "");
        let first = engine.version().unwrap();
        save(&engine, "k", "v2", "");

        let read = run(
            &engine,
            Command::Read(ReadArgs { path: "k".into(), at: Some(first.to_hex()) }),
        );
        assert_eq!(read, "v1");

        let mut out = Vec::new();
        let bad = Command::Read(ReadArgs { path: "k".into(), at: Some("zz".into()) });
        assert!(run_command_to(&engine, bad, &mut out).is_err());
    }

    #[test]
    fn log_lists_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_in(&dir);
        assert_eq!(
            run(&engine, Command::Log(LogArgs { limit: None, oneline: true })),
            "No revisions.\n"
        );
        save(&engine, "k", "1", "first");
        save(&engine, "k", "2", "");

        let log = run(&engine, Command::Log(LogArgs { limit: None, oneline: true }));
        let lines: Vec<_> = log.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("some message"));
        assert!(lines[1].ends_with("first"));

        let full = run(&engine, Command::Log(LogArgs { limit: Some(1), oneline: false }));
        assert!(full.contains("Author: gitdb <gitdb@github.com>"));
        assert!(full.contains("Parent: "));
        assert!(!full.contains("first"));
    }

    #[test]
    fn verify_reports_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_in(&dir);
        save(&engine, "k", "value", "");
        assert!(run(&engine, Command::Verify).contains("History integrity verified"));

        let objects = dir.path().join(".gitdb/objects");
        for fanout in fs::read_dir(&objects).unwrap() {
            for file in fs::read_dir(fanout.unwrap().path()).unwrap() {
                let path = file.unwrap().path();
                if fs::read(&path).unwrap().starts_with(b"blob ") {
                    fs::write(&path, b"blob 5\0VALUE").unwrap();
                }
            }
        }

        let mut out = Vec::new();
        assert!(run_command_to(&engine, Command::Verify, &mut out).is_err());
        assert!(String::from_utf8(out).unwrap().contains("HashMismatch"));
    }
}
