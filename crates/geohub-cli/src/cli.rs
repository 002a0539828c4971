use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use geohub_sdk::{AssetKind, Severity};

#[derive(Parser)]
#[command(
    name = "geohub",
    about = "GeoHub: local-first storage for point clouds, splats, and inspection photos",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Store directory; a `geohub.toml` inside it is picked up.
    #[arg(long, global = true, env = "GEOHUB_DATA_DIR", default_value = ".geohub")]
    pub data_dir: PathBuf,

    /// Workspace to act on instead of the remembered one.
    #[arg(short, long, global = true)]
    pub workspace: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// List, create, delete, or switch workspaces
    Workspace(WorkspaceArgs),
    /// Show the active workspace's layers
    Layers(LayersArgs),
    /// Add files as a new layer
    Upload(UploadArgs),
    /// Re-seed the demo workspace
    Demo(DemoArgs),
    /// Show or hide a layer
    Toggle(LayerRef),
    /// Rename a layer or change its visibility/opacity
    Update(UpdateArgs),
    /// Edit the annotation of one image in a photo set
    Annotate(AnnotateArgs),
    /// Delete a layer and its stored data
    Delete(LayerRef),
    /// Write a stored payload to a file
    Export(ExportArgs),
    /// Remove every workspace, layer, and payload
    Clear(ClearArgs),
}

#[derive(Args)]
pub struct WorkspaceArgs {
    #[command(subcommand)]
    pub action: Option<WorkspaceAction>,
}

#[derive(Subcommand)]
pub enum WorkspaceAction {
    List,
    Create {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    Delete {
        id: String,
    },
    Use {
        id: String,
    },
}

#[derive(Args)]
pub struct LayersArgs {
    /// Include image entries of photo sets
    #[arg(long)]
    pub images: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum KindArg {
    Splat,
    Cloud,
    Photo,
}

impl From<KindArg> for AssetKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Splat => AssetKind::Splat,
            KindArg::Cloud => AssetKind::Cloud,
            KindArg::Photo => AssetKind::Photo,
        }
    }
}

#[derive(Args)]
pub struct UploadArgs {
    pub kind: KindArg,
    /// Files or directories (walked recursively)
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
    #[arg(short, long)]
    pub name: Option<String>,
}

#[derive(Args)]
pub struct DemoArgs {}

#[derive(Args)]
pub struct LayerRef {
    pub layer: String,
}

#[derive(Args)]
pub struct UpdateArgs {
    pub layer: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub visible: Option<bool>,
    #[arg(long)]
    pub opacity: Option<f32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum SeverityArg {
    Low,
    Medium,
    High,
    Critical,
}

impl From<SeverityArg> for Severity {
    fn from(severity: SeverityArg) -> Self {
        match severity {
            SeverityArg::Low => Severity::Low,
            SeverityArg::Medium => Severity::Medium,
            SeverityArg::High => Severity::High,
            SeverityArg::Critical => Severity::Critical,
        }
    }
}

#[derive(Args)]
pub struct AnnotateArgs {
    pub layer: String,
    pub image: String,
    #[arg(long)]
    pub filename: Option<String>,
    #[arg(long)]
    pub analysis: Option<String>,
    #[arg(long)]
    pub severity: Option<SeverityArg>,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long)]
    pub heading: Option<f64>,
    #[arg(long, requires = "lng", allow_hyphen_values = true)]
    pub lat: Option<f64>,
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lng: Option<f64>,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Layer id, or image id for a photo-set image
    pub id: String,
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ClearArgs {
    #[arg(long)]
    pub yes: bool,
}
