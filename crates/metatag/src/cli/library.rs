//! `metatag library` - register, scan and browse library folders

use super::error::HelpfulError;
use super::output::{format_size, print_json, print_table, truncate};
use super::Session;
use clap::Subcommand;
use metatag::scan::{scan_library, ScanProgress};
use metatag_db::{FileRecord, Library};
use std::path::PathBuf;

#[derive(Subcommand, Debug, Clone)]
pub enum LibraryAction {
    /// Register a folder and scan it
    Add {
        path: PathBuf,
        /// Display name (defaults to the folder name)
        #[arg(long)]
        name: Option<String>,
        /// Register without scanning
        #[arg(long)]
        no_scan: bool,
    },
    /// List registered libraries
    List {
        #[arg(long)]
        json: bool,
    },
    /// Rescan a library for new and modified files
    Scan { id: i64 },
    /// List the files of a library
    Files {
        id: i64,
        /// Only files directly inside this folder
        #[arg(long)]
        folder: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Find files by name, path or tag value
    Search {
        query: String,
        #[arg(long)]
        json: bool,
    },
    /// Forget a library with its files, tags and history
    Remove { id: i64 },
}

pub async fn run(session: &Session, action: LibraryAction) -> anyhow::Result<()> {
    match action {
        LibraryAction::Add { path, name, no_scan } => add_library(session, path, name, no_scan).await,
        LibraryAction::List { json } => list_libraries(session, json).await,
        LibraryAction::Scan { id } => {
            let library = session.library(id).await?;
            scan(session, &library).await
        }
        LibraryAction::Files { id, folder, json } => list_files(session, id, folder, json).await,
        LibraryAction::Search { query, json } => {
            let files = session.db.search_files(&query).await?;
            print_files(&files, json)
        }
        LibraryAction::Remove { id } => {
            let library = session.library(id).await?;
            session.db.remove_library(id).await?;
            println!("Removed library {} ({})", library.name, library.path);
            Ok(())
        }
    }
}

async fn add_library(
    session: &Session,
    path: PathBuf,
    name: Option<String>,
    no_scan: bool,
) -> anyhow::Result<()> {
    if !path.is_dir() {
        return Err(HelpfulError::not_a_directory(&path).into());
    }
    let path = path.canonicalize()?;
    let name = name.unwrap_or_else(|| {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned())
    });

    let library = session
        .db
        .add_library(&path.to_string_lossy(), &name)
        .await
        .map_err(|e| {
            HelpfulError::new(format!("Failed to add library: {}", e))
                .with_context(format!("Path: {}", path.display()))
                .with_suggestion("TRY: Check whether it is already registered: metatag library list")
        })?;
    println!("Added library {} [{}]: {}", library.name, library.id, library.path);

    if !no_scan {
        scan(session, &library).await?;
    }
    Ok(())
}

async fn scan(session: &Session, library: &Library) -> anyhow::Result<()> {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<ScanProgress>();
    let printer = tokio::spawn(async move {
        while let Some(p) = rx.recv().await {
            if p.scanned == p.total || p.scanned % 100 == 0 {
                eprintln!("  scanned {}/{}", p.scanned, p.total);
            }
        }
    });

    let result = scan_library(&session.db, library, &session.config, Some(&tx)).await;
    drop(tx);
    let _ = printer.await;
    let stats = result?;

    println!(
        "Scanned {}: {} files, {} new or changed, {} unchanged, {} sidecar tags",
        library.name, stats.discovered, stats.updated, stats.unchanged, stats.sidecar_tags
    );
    if stats.unreadable > 0 {
        println!("  {} entries could not be read", stats.unreadable);
    }
    Ok(())
}

async fn list_libraries(session: &Session, json: bool) -> anyhow::Result<()> {
    let libraries = session.db.list_libraries().await?;
    if json {
        return print_json(&libraries);
    }
    if libraries.is_empty() {
        println!("No libraries registered.");
        println!();
        println!("Add one with:");
        println!("  metatag library add /path/to/music");
        return Ok(());
    }

    let mut rows = Vec::new();
    for library in &libraries {
        let count = session.db.list_files(library.id).await?.len();
        rows.push(vec![
            library.id.to_string(),
            library.name.clone(),
            library.path.clone(),
            count.to_string(),
        ]);
    }
    print_table(&["ID", "NAME", "PATH", "FILES"], rows);
    Ok(())
}

async fn list_files(
    session: &Session,
    id: i64,
    folder: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let library = session.library(id).await?;
    let files = match folder {
        Some(folder) => session
            .db
            .list_files_in_folder(folder.trim_end_matches('/'))
            .await?
            .into_iter()
            .filter(|f| f.library_id == library.id)
            .collect(),
        None => session.db.list_files(library.id).await?,
    };
    print_files(&files, json)
}

fn print_files(files: &[FileRecord], json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&files);
    }
    if files.is_empty() {
        println!("No files.");
        return Ok(());
    }

    let rows = files
        .iter()
        .map(|f| {
            vec![
                f.id.to_string(),
                truncate(&f.filename, 60),
                f.file_type.to_string(),
                format_size(f.size),
                f.modified_at.clone(),
            ]
        })
        .collect();
    print_table(&["ID", "FILENAME", "TYPE", "SIZE", "MODIFIED"], rows);
    println!("{} files", files.len());
    Ok(())
}
