use std::path::PathBuf;

use anyhow::{bail, Context as _};
use colored::Colorize;
use geohub_sdk::{
    AssetOutcome, BlobId, GeoHub, GeoPoint, HubConfig, ImageId, ImagePatch, IngestFile, Layer,
    LayerContent, LayerId, LayerPatch, Workspace, WorkspaceId,
};
use serde::Serialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::cli::*;
use crate::session::Session;

struct Context {
    hub: GeoHub,
    data_dir: PathBuf,
    format: OutputFormat,
    workspace: Option<WorkspaceId>,
}

impl Context {
    /// The `--workspace` override if given, else the remembered one (falling
    /// back to the demo workspace). The result is remembered.
    async fn active(&self) -> anyhow::Result<Workspace> {
        let ws = match &self.workspace {
            Some(id) => {
                let ws = self.hub.get_workspace(id).await.with_context(|| format!("workspace {id}"))?;
                self.hub.resolve_active_workspace(Some(&ws.id)).await?
            }
            None => {
                let session = Session::load(&self.data_dir);
                self.hub.resolve_active_workspace(session.last_workspace.as_ref()).await?
            }
        };
        self.remember(Some(ws.id.clone()))?;
        Ok(ws)
    }

    fn remember(&self, workspace: Option<WorkspaceId>) -> anyhow::Result<()> {
        Session { last_workspace: workspace }.save(&self.data_dir)
    }

    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce()) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
            OutputFormat::Text => text(),
        }
        Ok(())
    }
}

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = HubConfig::load_from_dir(&cli.data_dir)?;
    let ctx = Context {
        hub: GeoHub::open(&config)?,
        data_dir: cli.data_dir,
        format: cli.format,
        workspace: cli.workspace.map(WorkspaceId::new),
    };

    match cli.command {
        Command::Workspace(args) => cmd_workspace(&ctx, args).await,
        Command::Layers(args) => cmd_layers(&ctx, args).await,
        Command::Upload(args) => cmd_upload(&ctx, args).await,
        Command::Demo(_) => cmd_demo(&ctx).await,
        Command::Toggle(args) => {
            let layer = ctx.hub.toggle_visibility(&LayerId::new(args.layer)).await?;
            let state = if layer.visible { "visible".green() } else { "hidden".dimmed() };
            ctx.emit(&layer, || println!("{} {} is now {}", "✓".green(), layer.name.bold(), state))
        }
        Command::Update(args) => cmd_update(&ctx, args).await,
        Command::Annotate(args) => cmd_annotate(&ctx, args).await,
        Command::Delete(args) => {
            let layer = ctx.hub.delete_layer(&LayerId::new(args.layer)).await?;
            ctx.emit(&layer, || println!("{} Deleted {} ({})", "✓".green(), layer.name.bold(), layer.id))
        }
        Command::Export(args) => cmd_export(&ctx, args).await,
        Command::Clear(args) => {
            if !args.yes {
                bail!("refusing to clear everything without --yes");
            }
            ctx.hub.clear_all().await?;
            ctx.remember(None)?;
            ctx.emit(&Cleared { cleared: true }, || {
                println!("{} All workspaces, layers, and payloads removed.", "✓".green().bold());
            })
        }
    }
}

async fn cmd_workspace(ctx: &Context, args: WorkspaceArgs) -> anyhow::Result<()> {
    match args.action.unwrap_or(WorkspaceAction::List) {
        WorkspaceAction::List => {
            let active = ctx.active().await?;
            let all = ctx.hub.list_workspaces().await?;
            ctx.emit(&all, || {
                for ws in &all {
                    let marker = if ws.id == active.id { "*".green().bold() } else { " ".normal() };
                    println!(
                        "{} {}  {}  {} layer(s)",
                        marker,
                        ws.id.to_string().yellow(),
                        ws.name.bold(),
                        ws.item_count
                    );
                    if let Some(description) = &ws.description {
                        println!("    {}", description.dimmed());
                    }
                }
            })
        }
        WorkspaceAction::Create { name, description } => {
            let ws = ctx.hub.create_workspace(&name, description.as_deref()).await?;
            ctx.remember(Some(ws.id.clone()))?;
            ctx.emit(&ws, || {
                println!("{} Created workspace {} ({})", "✓".green().bold(), ws.name.bold(), ws.id.to_string().yellow());
            })
        }
        WorkspaceAction::Delete { id } => {
            let removed = remove_workspace(ctx, WorkspaceId::new(id)).await?;
            ctx.emit(&removed, || {
                println!(
                    "{} Deleted workspace {} and {} layer(s)",
                    "✓".green(),
                    removed.workspace.to_string().yellow(),
                    removed.layers
                );
            })
        }
        WorkspaceAction::Use { id } => {
            let id = WorkspaceId::new(id);
            let ws = ctx.hub.get_workspace(&id).await.with_context(|| format!("workspace {id}"))?;
            let ws = ctx.hub.resolve_active_workspace(Some(&ws.id)).await?;
            ctx.remember(Some(ws.id.clone()))?;
            ctx.emit(&ws, || println!("Switched to {}", ws.name.bold()))
        }
    }
}

#[derive(Debug, Serialize)]
struct WorkspaceRemoved {
    workspace: WorkspaceId,
    layers: usize,
}

#[derive(Debug, Serialize)]
struct Exported {
    id: String,
    bytes: u64,
    mime_type: String,
    path: PathBuf,
}

#[derive(Debug, Serialize)]
struct Cleared {
    cleared: bool,
}

async fn remove_workspace(ctx: &Context, id: WorkspaceId) -> anyhow::Result<WorkspaceRemoved> {
    let layers = ctx.hub.delete_workspace(&id).await?;
    if Session::load(&ctx.data_dir).last_workspace.as_ref() == Some(&id) {
        ctx.remember(None)?;
    }
    Ok(WorkspaceRemoved { workspace: id, layers })
}

async fn cmd_layers(ctx: &Context, args: LayersArgs) -> anyhow::Result<()> {
    let ws = ctx.active().await?;
    let layers = ctx.hub.load_workspace_layers(&ws.id).await?;
    ctx.emit(&layers, || {
        println!("Workspace {} ({} layer(s))", ws.name.bold(), ws.item_count);
        for layer in &layers {
            print_layer(layer);
            if args.images {
                print_images(layer);
            }
        }
    })
}

async fn cmd_upload(ctx: &Context, args: UploadArgs) -> anyhow::Result<()> {
    let ws = ctx.active().await?;
    let mut files = Vec::new();
    for path in collect_files(&args.paths)? {
        files.push(IngestFile::read(&path).await?);
    }
    debug!(files = files.len(), "upload collected");
    let layers = ctx
        .hub
        .handle_upload(&ws.id, files, args.name.as_deref(), args.kind.into())
        .await?;
    ctx.emit(&layers, || {
        for layer in &layers {
            println!("{} Added", "✓".green().bold());
            print_layer(layer);
        }
    })
}

async fn cmd_demo(ctx: &Context) -> anyhow::Result<()> {
    let ws = ctx.hub.ensure_default_workspace().await?;
    ctx.remember(Some(ws.id.clone()))?;
    let report = ctx.hub.run_demo_bootstrap(&ws.id).await?;
    ctx.emit(&report.layers, || {
        println!("Demo workspace reset ({} old layer(s) removed)", report.removed);
        for asset in &report.assets {
            let outcome = match asset.outcome {
                AssetOutcome::Persisted => "stored".green(),
                AssetOutcome::MemoryOnly => "memory only".yellow(),
                AssetOutcome::Aborted => "unavailable".red(),
            };
            let tier = asset.tier.as_ref().map(ToString::to_string).unwrap_or_default();
            println!("  {:<24} {} {}", asset.asset, outcome, tier.dimmed());
        }
    })
}

async fn cmd_update(ctx: &Context, args: UpdateArgs) -> anyhow::Result<()> {
    let patch = LayerPatch {
        name: args.name,
        visible: args.visible,
        opacity: args.opacity,
        image: None,
    };
    if patch.is_empty() {
        bail!("nothing to update: pass --name, --visible, or --opacity");
    }
    let layer = ctx.hub.update_layer(&LayerId::new(args.layer), &patch).await?;
    ctx.emit(&layer, || {
        println!("{} Updated", "✓".green());
        print_layer(&layer);
    })
}

async fn cmd_annotate(ctx: &Context, args: AnnotateArgs) -> anyhow::Result<()> {
    let mut image = ImagePatch::new(ImageId::new(args.image));
    image.filename = args.filename;
    image.analysis = args.analysis;
    image.severity = args.severity.map(Into::into);
    image.notes = args.notes;
    image.heading = args.heading;
    image.position = match (args.lat, args.lng) {
        (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
        _ => None,
    };
    let patch = LayerPatch {
        image: Some(image),
        ..Default::default()
    };
    let layer = ctx.hub.update_layer(&LayerId::new(args.layer), &patch).await?;
    ctx.emit(&layer, || {
        println!("{} Annotation saved", "✓".green());
        print_images(&layer);
    })
}

async fn cmd_export(ctx: &Context, args: ExportArgs) -> anyhow::Result<()> {
    let exported = export(ctx, args).await?;
    ctx.emit(&exported, || {
        println!(
            "{} Wrote {} bytes ({}) to {}",
            "✓".green(),
            exported.bytes,
            exported.mime_type,
            exported.path.display()
        );
    })
}

async fn export(ctx: &Context, args: ExportArgs) -> anyhow::Result<Exported> {
    let blob = ctx.hub.read_blob(&BlobId::new(args.id.as_str())).await?;
    let path = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("{}.bin", args.id)));
    tokio::fs::write(&path, &blob.data)
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(Exported {
        bytes: blob.size(),
        mime_type: blob.mime_type,
        id: args.id,
        path,
    })
}

/// Expand directories into the regular files below them, in name order.
pub fn collect_files(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path).sort_by_file_name() {
                let entry = entry?;
                if entry.file_type().is_file() {
                    files.push(entry.into_path());
                }
            }
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            bail!("{} is not a file or directory", path.display());
        }
    }
    if files.is_empty() {
        bail!("no files found");
    }
    Ok(files)
}

fn print_layer(layer: &Layer) {
    let visibility = if layer.visible { "●".green() } else { "○".dimmed() };
    let detail = match &layer.content {
        LayerContent::GaussianSplat(s) => format!("{} splats, {} bytes", s.splat_count, s.file_size),
        LayerContent::PointCloud(p) => format!("{:?}", p.format),
        LayerContent::PhotoSet(p) => format!("{} image(s)", p.images.len()),
    };
    let loaded = if layer.url().is_some() || layer.images().is_some() {
        String::new()
    } else {
        " (no content)".red().to_string()
    };
    println!(
        "  {} {}  {:<14} {}  {}{}",
        visibility,
        layer.id.to_string().yellow(),
        layer.kind().to_string().cyan(),
        layer.name.bold(),
        detail.dimmed(),
        loaded
    );
}

fn print_images(layer: &Layer) {
    for image in layer.images().unwrap_or_default() {
        let position = image
            .position()
            .map(|p| format!("{:.6}, {:.6}", p.lat, p.lng))
            .unwrap_or_else(|| "no GPS".into());
        let severity = image.severity.map(|s| s.to_string()).unwrap_or_default();
        println!(
            "      {}  {}  {}  {}",
            image.id.to_string().yellow(),
            image.filename,
            position.dimmed(),
            severity.red()
        );
        if let Some(analysis) = &image.analysis {
            println!("        {}", analysis);
        }
    }
}
