use anyhow::Result;
use clap::Parser;
use imageset::DatasetMetadata;
use prettytable::{cell, row, Table};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Parser)]
enum Opts {
    /// Print summary tables for a dataset metadata file
    Info {
        /// dataset metadata file
        metadata_file: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Opts::parse() {
        Opts::Info { metadata_file } => {
            info(&metadata_file)?;
        }
    }

    Ok(())
}

fn info(metadata_file: impl AsRef<Path>) -> Result<()> {
    let data = DatasetMetadata::open(metadata_file)?;

    // overview
    {
        let num_boxes: usize = data.images.iter().map(|image| image.boxes.len()).sum();
        let num_ignored: usize = data
            .images
            .iter()
            .flat_map(|image| &image.boxes)
            .filter(|box_| box_.ignore)
            .count();

        let mut table = Table::new();
        table.add_row(row!["name", data.name.as_deref().unwrap_or("")]);
        table.add_row(row!["images", data.images.len()]);
        table.add_row(row!["boxes", num_boxes]);
        table.add_row(row!["ignored boxes", num_ignored]);
        table.printstd();
    }

    // per-label box counts
    {
        let mut counts: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
        for box_ in data.images.iter().flat_map(|image| &image.boxes) {
            let label = box_.label.as_deref().unwrap_or("<unlabeled>");
            let entry = counts.entry(label).or_default();
            if box_.ignore {
                entry.1 += 1;
            } else {
                entry.0 += 1;
            }
        }

        let mut table = Table::new();
        table.add_row(row!["label", "kept", "ignored"]);
        for (label, (kept, ignored)) in counts {
            table.add_row(row![label, kept, ignored]);
        }
        table.printstd();
    }

    // part usage
    {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for box_ in data.images.iter().flat_map(|image| &image.boxes) {
            for name in box_.parts.keys() {
                *counts.entry(name.as_str()).or_default() += 1;
            }
        }

        let mut table = Table::new();
        table.add_row(row!["part", "boxes"]);
        for (name, count) in counts {
            table.add_row(row![name, count]);
        }
        table.printstd();
    }

    Ok(())
}
