// ============================================================================
// buildstep CLI — drive build-up step navigation on .bsd documents
// ============================================================================
//
// Usage examples:
//   buildstep new deck.bsd --steps 10,20,30
//   buildstep next deck.bsd
//   buildstep prev deck.bsd --preview deck.png
//   buildstep run increase-step deck.bsd
//   buildstep show deck.bsd
//   buildstep config --set new_width=800
//
// Every command runs synchronously to completion: load, mutate, save.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use image::Rgba;

use crate::actions::{self, ACTIONS, DECREASE_STEP, INCREASE_STEP};
use crate::document::{Document, Layer, LayerContent, MAX_CANVAS_DIM};
use crate::host::Host;
use crate::io::{load_document, save_document, save_preview};
use crate::settings::Settings;
use crate::steps::{self, extract_labels, read_marker};
use crate::{log_err, log_info};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// Build-up slide navigator for layered documents.
///
/// A document holds group layers named `#<number>#<title>`, one per build-up
/// step, and a text layer named `step` holding the step on show.
#[derive(Parser, Debug)]
#[command(name = "buildstep", version, about = "Build-up slide navigator for layered documents")]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Disable the session log file for this run.
    #[arg(long, global = true)]
    pub no_log: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Advance to the next step ("increase-step").
    Next(StepArgs),
    /// Go back to the previous step ("decrease-step").
    Prev(StepArgs),
    /// Run a registered action by id.
    Run {
        /// Action id, see `buildstep actions`.
        action: String,
        #[command(flatten)]
        step: StepArgs,
    },
    /// List the registered actions.
    Actions,
    /// Create a demo document with one step group per label.
    New {
        /// Output document path.
        document: PathBuf,
        /// Step labels, comma separated.
        #[arg(long, required = true, value_delimiter = ',', allow_negative_numbers = true)]
        steps: Vec<i64>,
        /// Canvas size as WIDTHxHEIGHT (defaults to the settings file).
        #[arg(long, value_name = "WxH", value_parser = parse_size)]
        size: Option<(u32, u32)>,
        /// Initial step (defaults to the smallest label).
        #[arg(long, allow_negative_numbers = true)]
        step: Option<i64>,
    },
    /// Print the layer tree and the resolved steps.
    Show {
        document: PathBuf,
    },
    /// Flatten the visible layers to a PNG.
    Render {
        document: PathBuf,
        output: PathBuf,
    },
    /// Print the settings file, or change entries in it.
    Config {
        /// Setting to store, e.g. `new_width=800`. Repeatable.
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },
}

#[derive(clap::Args, Debug)]
pub struct StepArgs {
    /// Document to navigate; saved in place.
    pub document: PathBuf,
    /// Also write a PNG of the result.
    #[arg(long, value_name = "PNG")]
    pub preview: Option<PathBuf>,
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
    let w: u32 = w.trim().parse().map_err(|_| format!("invalid width '{}'", w))?;
    let h: u32 = h.trim().parse().map_err(|_| format!("invalid height '{}'", h))?;
    if w == 0 || h == 0 {
        return Err("canvas dimensions cannot be zero".to_string());
    }
    if w > MAX_CANVAS_DIM || h > MAX_CANVAS_DIM {
        return Err(format!("canvas sides are limited to {} pixels", MAX_CANVAS_DIM));
    }
    Ok((w, h))
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run one command and return an OS exit code.
pub fn run(args: CliArgs, settings: &Settings) -> ExitCode {
    let result = match args.command {
        Command::Next(step) => navigate(INCREASE_STEP, &step, settings),
        Command::Prev(step) => navigate(DECREASE_STEP, &step, settings),
        Command::Run { action, step } => navigate(&action, &step, settings),
        Command::Actions => {
            for a in ACTIONS {
                println!("{:<16} {:<34} {}", a.id, a.menu_path, a.label);
            }
            Ok(())
        }
        Command::New {
            document,
            steps,
            size,
            step,
        } => {
            let (w, h) = size.unwrap_or((settings.new_width, settings.new_height));
            create(&document, &steps, step, w, h)
        }
        Command::Show { document } => show(&document),
        Command::Render { document, output } => render(&document, &output),
        Command::Config { set } => config(&set, settings),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log_err!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

fn navigate(action: &str, args: &StepArgs, settings: &Settings) -> Result<(), String> {
    let mut doc = load_document(&args.document)
        .map_err(|e| format!("could not open '{}': {}", args.document.display(), e))?;
    log_info!("Loaded {}", args.document.display());

    let new_step = actions::run_action(&mut doc, action).map_err(|e| e.to_string())?;

    save_document(&doc, &args.document)
        .map_err(|e| format!("could not save '{}': {}", args.document.display(), e))?;
    println!("step: {}", new_step);

    let preview = args
        .preview
        .clone()
        .or_else(|| settings.preview_after_step.then(|| args.document.with_extension("png")));
    if let Some(png) = preview {
        save_preview(&doc, &png).map_err(|e| format!("preview failed: {}", e))?;
        log_info!("Preview written to {}", png.display());
    }
    Ok(())
}

/// Opacity of the demo highlight layers, so stacked steps tint rather than cover.
const DEMO_COLOR_OPACITY: f32 = 35.0;
const DEMO_INK: Rgba<u8> = Rgba([0x30, 0x30, 0x30, 0xFF]);

fn create(path: &Path, labels: &[i64], start: Option<i64>, w: u32, h: u32) -> Result<(), String> {
    let doc = build_demo(labels, start, w, h).map_err(|e| e.to_string())?;
    save_document(&doc, path).map_err(|e| format!("could not save '{}': {}", path.display(), e))?;
    log_info!("Created {} with {} steps", path.display(), labels.len());
    println!("created {} ({} steps)", path.display(), extract_labels(&doc).len());
    Ok(())
}

/// One group per label, each with a content band, a `color` highlight and a
/// `hint` caption, plus the `step` marker. The initial step is rendered.
pub fn build_demo(
    labels: &[i64],
    start: Option<i64>,
    w: u32,
    h: u32,
) -> Result<Document, steps::StepError> {
    let mut sorted = labels.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    let first = *sorted.first().ok_or(steps::StepError::NoStepGroups)?;
    let n = sorted.len() as u32;

    let mut doc = Document::try_new(w, h)?;
    for (i, &label) in sorted.iter().enumerate() {
        let group = doc.add_group(None, &format!("#{}#Step {}", label, label))?;

        let content = doc.add_plain(Some(group), "content")?;
        let top = i as u32 * h / n;
        let bottom = ((i as u32 + 1) * h / n).max(top + 1).min(h);
        let pixels = doc.pixels_mut(content)?;
        for y in top..bottom {
            for x in 0..w {
                pixels.put_pixel(x, y, DEMO_INK);
            }
        }

        let color = doc.add_plain(Some(group), "color")?;
        doc.set_opacity(color, DEMO_COLOR_OPACITY)?;
        doc.add_text(Some(group), "hint", &format!("Step {}", label))?;
    }

    let step = start.unwrap_or(first);
    doc.add_text(None, steps::MARKER_NAME, &step.to_string())?;
    let groups = extract_labels(&doc);
    steps::apply(&mut doc, &groups, step)?;
    Ok(doc)
}

fn show(path: &Path) -> Result<(), String> {
    let doc = load_document(path).map_err(|e| format!("could not open '{}': {}", path.display(), e))?;

    println!("{} ({}x{})", path.display(), doc.width, doc.height);
    for layer in doc.layers.iter().rev() {
        print_layer(layer, 1);
    }

    let groups = extract_labels(&doc);
    let labels: Vec<String> = groups.keys().map(|l| l.to_string()).collect();
    println!("steps: {}", if labels.is_empty() { "(none)".to_string() } else { labels.join(", ") });
    match read_marker(&doc) {
        Ok((_, step)) => println!("current: {}", step),
        Err(e) => println!("current: ? ({})", e),
    }
    Ok(())
}

fn print_layer(layer: &Layer, depth: usize) {
    let indent = "  ".repeat(depth);
    let eye = if layer.visible { "visible" } else { "hidden" };
    let extra = match &layer.content {
        LayerContent::Text(t) => format!(" text={:?}", t),
        _ => String::new(),
    };
    println!(
        "{}[{}] {} {:?} {} {:.0}%{}",
        indent,
        layer.id,
        layer.kind().label(),
        layer.name,
        eye,
        layer.opacity * 100.0,
        extra
    );
    for child in layer.children().iter().rev() {
        print_layer(child, depth + 1);
    }
}

fn config(pairs: &[String], settings: &Settings) -> Result<(), String> {
    let path = Settings::settings_path().ok_or_else(|| "no settings directory for this user".to_string())?;
    let mut current = settings.clone();
    if !pairs.is_empty() {
        for pair in pairs {
            let (key, val) = pair
                .split_once('=')
                .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", pair))?;
            current.apply_pair(key, val)?;
        }
        current
            .save()
            .map_err(|e| format!("could not save '{}': {}", path.display(), e))?;
        log_info!("Settings saved to {}", path.display());
    }
    println!("# {}", path.display());
    print!("{}", current.to_cfg());
    Ok(())
}

fn render(path: &Path, output: &Path) -> Result<(), String> {
    let doc = load_document(path).map_err(|e| format!("could not open '{}': {}", path.display(), e))?;
    save_preview(&doc, output).map_err(|e| format!("could not write '{}': {}", output.display(), e))?;
    println!("wrote {}", output.display());
    Ok(())
}
