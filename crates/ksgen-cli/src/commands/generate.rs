//! Generate command - compile an admins spec into a manifest tree
//!
//! The output directory is wiped first, so a failed run never leaves old and
//! new files mixed together.

use std::path::{Component, Path, PathBuf};

use clap::Args;
use tracing::info;

use ksgen_manifests::{ClusterDriver, ManifestTree};

use crate::config::{load_admins, load_role_catalog};
use crate::writer::DiskWriter;
use crate::{Error, Result};

/// Generate manifests for an admins spec
#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Path to the admins spec YAML file
    #[arg(short = 'a', long, env = "KSGEN_ADMINS")]
    pub admins: PathBuf,

    /// Directory holding host.yaml and member.yaml role templates
    #[arg(short = 'r', long, env = "KSGEN_ROLES_DIR")]
    pub roles: PathBuf,

    /// Output directory, deleted and recreated on every run
    #[arg(short = 'o', long, env = "KSGEN_OUT_DIR", default_value = "out")]
    pub out_dir: PathBuf,

    /// Host and member run in the same cluster; shared objects go to base/
    #[arg(long)]
    pub single_cluster: bool,
}

pub fn run(args: GenerateArgs) -> Result<()> {
    let spec = load_admins(&args.admins)?;
    let catalog = load_role_catalog(&args.roles)?;

    wipe_output(&args.out_dir)?;

    let store = ClusterDriver::new(&spec, &catalog)
        .single_cluster(args.single_cluster)
        .compile()?;
    let tree = ManifestTree::build(&store)?;
    tree.write_to(&mut DiskWriter::new(&args.out_dir))?;

    info!(
        out_dir = %args.out_dir.display(),
        files = tree.len(),
        "generated manifests"
    );
    Ok(())
}

fn wipe_output(out_dir: &Path) -> Result<()> {
    // The last component must name the output directory itself.
    if !matches!(out_dir.components().next_back(), Some(Component::Normal(_))) {
        return Err(Error::validation(format!(
            "refusing to wipe output directory '{}'",
            out_dir.display()
        )));
    }
    if out_dir.exists() {
        std::fs::remove_dir_all(out_dir)?;
    }
    std::fs::create_dir_all(out_dir)?;
    Ok(())
}
