//! Interactive run setup on a terminal.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;

use playclip_models::RunConfig;

use crate::clip_pipeline::{select_workflow, EventSource, RunRequest};
use crate::error::{WorkerError, WorkerResult};
use playclip_models::Workflow;

/// Configuration and inputs collected from the prompt.
#[derive(Debug, Clone)]
pub struct InteractiveRun {
    pub config: RunConfig,
    pub request: RunRequest,
}

/// Show the operation menu and collect everything a run needs.
pub fn prompt_run<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> WorkerResult<InteractiveRun> {
    writeln!(output, "Select operation:")?;
    writeln!(output, "1. Split video into clips")?;
    writeln!(output, "2. Create sidecar files for existing clips")?;
    writeln!(output, "3. Split video and create sidecar files")?;
    writeln!(output, "4. Advanced configuration")?;

    let choice = ask(input, output, "Enter choice (1-4): ")?;
    let config = match choice.as_str() {
        "1" => RunConfig::split_only(),
        "2" => RunConfig::sidecars_only(),
        "3" => RunConfig::default(),
        "4" => prompt_advanced(input, output)?,
        other => {
            return Err(WorkerError::config_error(format!(
                "invalid choice '{}'",
                other
            )))
        }
    };
    config.validate()?;

    let events = PathBuf::from(ask_required(input, output, "Event table (CSV) path: ")?);
    let request = match select_workflow(&config) {
        Workflow::Split => {
            let video = PathBuf::from(ask_required(input, output, "Source video path: ")?);
            let root = ask(input, output, "Output folder (default: next to the video): ")?;
            let root = (!root.is_empty()).then(|| PathBuf::from(root));
            RunRequest::split(EventSource::Table(events), video, root.as_deref())
        }
        _ => {
            let clips = PathBuf::from(ask_required(input, output, "Clips folder: ")?);
            RunRequest::sidecars(EventSource::Table(events), clips)
        }
    };

    Ok(InteractiveRun { config, request })
}

fn prompt_advanced<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> WorkerResult<RunConfig> {
    writeln!(output, "\nAdvanced Configuration:")?;
    let defaults = RunConfig::default();
    Ok(RunConfig {
        split_video: true,
        start_number: ask_parsed(input, output, "Starting number for clips (default: 1): ", defaults.start_number)?,
        skip: ask_parsed(input, output, "Number of initial events to skip (default: 0): ", defaults.skip)?,
        reencode: ask_yes_no(input, output, "Re-encode video? (y/n, default: n): ", false)?,
        time_offset: ask_parsed(input, output, "Time offset in seconds (default: 0): ", defaults.time_offset)?,
        buffer: ask_parsed(input, output, "Buffer time in seconds (default: 0.5): ", defaults.buffer)?,
        create_metadata: ask_yes_no(input, output, "Create sidecar files? (y/n, default: y): ", true)?,
    })
}

fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str) -> WorkerResult<String> {
    write!(output, "{}", prompt)?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn ask_required<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str) -> WorkerResult<String> {
    let answer = ask(input, output, prompt)?;
    if answer.is_empty() {
        return Err(WorkerError::config_error(format!(
            "no answer for '{}'",
            prompt.trim_end_matches([':', ' '])
        )));
    }
    // Paths pasted from a file manager often come quoted
    Ok(answer.trim_matches('"').to_string())
}

fn ask_parsed<R: BufRead, W: Write, T: FromStr>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
    default: T,
) -> WorkerResult<T> {
    let answer = ask(input, output, prompt)?;
    if answer.is_empty() {
        return Ok(default);
    }
    answer
        .parse()
        .map_err(|_| WorkerError::config_error(format!("invalid number '{}'", answer)))
}

fn ask_yes_no<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
    default: bool,
) -> WorkerResult<bool> {
    let answer = ask(input, output, prompt)?.to_lowercase();
    Ok(match answer.as_str() {
        "y" | "yes" => true,
        "n" | "no" => false,
        _ => default,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::Path;

    fn run(answers: &str) -> WorkerResult<InteractiveRun> {
        let mut input = Cursor::new(answers.as_bytes().to_vec());
        let mut output = Vec::new();
        prompt_run(&mut input, &mut output)
    }

    #[test]
    fn test_split_only() {
        let result = run("1\nevents.csv\n/film/game.mp4\n\n").unwrap();
        assert!(result.config.split_video);
        assert!(!result.config.create_metadata);
        assert_eq!(result.request.clips_dir, Path::new("/film/game Clips"));
    }

    #[test]
    fn test_sidecars_only() {
        let result = run("2\nevents.csv\n\"/film/game Clips\"\n").unwrap();
        assert!(!result.config.split_video);
        assert!(result.request.video.is_none());
        assert_eq!(result.request.clips_dir, Path::new("/film/game Clips"));
    }

    #[test]
    fn test_advanced() {
        let result = run("4\n10\n3\ny\n-1.5\n\nn\nevents.csv\ngame.mp4\n/out\n").unwrap();
        let config = result.config;
        assert_eq!(config.start_number, 10);
        assert_eq!(config.skip, 3);
        assert!(config.reencode);
        assert_eq!(config.time_offset, -1.5);
        assert_eq!(config.buffer, 0.5);
        assert!(!config.create_metadata);
        assert_eq!(result.request.clips_dir, Path::new("/out/game Clips"));
    }

    #[test]
    fn test_invalid_input() {
        assert!(run("7\n").is_err());
        assert!(run("4\nabc\n").is_err());
        assert!(run("4\n0\n\n\n\n\n\nevents.csv\ngame.mp4\n\n").is_err());
        assert!(run("3\n\n").is_err());
    }
}
