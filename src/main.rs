mod catalogs;
mod config;
mod cover_cache;
mod http_fetch;
mod metadata_resolver;
mod similarity;

use std::path::{Path, PathBuf};

use log::info;

use catalogs::kitsu::KitsuAdapter;
use catalogs::mangadex::MangaDexAdapter;
use config::{sanitize_config, Config};
use cover_cache::CoverCache;
use metadata_resolver::{MetadataResolver, ResolvedMetadata, ThreadPacer};

const LOCAL_COVER_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "webp", "gif"];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut clog = colog::default_builder();
    clog.filter(None, log::LevelFilter::Debug);
    clog.init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((mode, rest)) = args.split_first() else {
        print_usage();
        return Ok(());
    };

    let config = load_config()?;
    let resolver = build_resolver(&config);

    match mode.as_str() {
        "scan" if rest.len() == 1 => scan_directory(&resolver, Path::new(&rest[0])),
        "resolve" if !rest.is_empty() => {
            resolve_titles(&resolver, rest);
            Ok(())
        }
        "lookup" if rest.len() == 1 => lookup_reference(&resolver, &rest[0]),
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn print_usage() {
    eprintln!("Usage: paneldex scan <dir> | resolve <title>... | lookup <id-or-url>");
}

fn load_config() -> Result<Config, Box<dyn std::error::Error>> {
    let config_dir = dirs::config_dir().ok_or("no user config directory")?;
    let config_file = config_dir.join("paneldex.toml");

    if !config_file.exists() {
        let default_config = Config::default();
        info!(
            "Config file not found. Creating default config. path={}",
            config_file.display()
        );
        std::fs::write(&config_file, toml::to_string(&default_config)?)?;
    }

    let config_content = std::fs::read_to_string(&config_file)?;
    Ok(sanitize_config(
        toml::from_str::<Config>(&config_content).unwrap_or_default(),
    ))
}

fn cover_cache_root(config: &Config) -> PathBuf {
    match &config.enrichment.cover_cache_dir {
        Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        _ => dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("paneldex")
            .join("covers"),
    }
}

fn build_resolver(config: &Config) -> MetadataResolver {
    MetadataResolver::new(
        Box::new(MangaDexAdapter::new()),
        Box::new(KitsuAdapter::new()),
        Box::new(CoverCache::on_disk(cover_cache_root(config))),
        Box::new(ThreadPacer),
        config.enrichment.clone(),
    )
}

/// Scans one library directory: each immediate subdirectory is a title
/// query. Enrichment is best-effort; the scan reports every entry it saw
/// even when no provider matched.
fn scan_directory(
    resolver: &MetadataResolver,
    dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut titles = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                titles.push(name.to_string());
            }
        }
    }
    titles.sort();
    info!(
        "Scan: found {} title folders in {}",
        titles.len(),
        dir.display()
    );

    let results = resolver.resolve_batch(&titles);
    let mut enriched = 0usize;
    for (title, resolved) in &results {
        // A cover file shipped inside the title folder beats any
        // network-sourced one.
        let local_cover = find_local_cover(&dir.join(title));
        match resolved {
            Some(metadata) => {
                enriched += 1;
                report_title(title, metadata, local_cover.as_deref());
            }
            None => match local_cover {
                Some(cover) => println!("{title}: local cover {}", cover.display()),
                None => println!("{title}: no metadata found"),
            },
        }
    }
    println!("Processed {} entries ({} enriched)", results.len(), enriched);
    Ok(())
}

/// First `cover.<ext>` image directly inside the title folder, if any.
fn find_local_cover(folder: &Path) -> Option<PathBuf> {
    LOCAL_COVER_EXTENSIONS
        .iter()
        .map(|extension| folder.join(format!("cover.{extension}")))
        .find(|candidate| candidate.is_file())
}

fn resolve_titles(resolver: &MetadataResolver, titles: &[String]) {
    for (title, resolved) in resolver.resolve_batch(titles) {
        match resolved {
            Some(metadata) => report_title(&title, &metadata, None),
            None => println!("{title}: no metadata found"),
        }
    }
}

fn lookup_reference(
    resolver: &MetadataResolver,
    reference: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    match resolver.resolve_by_external_id(reference) {
        Ok(Some(metadata)) => {
            report_title(reference, &metadata, None);
            Ok(())
        }
        Ok(None) => {
            println!("{reference}: no catalog record found");
            Ok(())
        }
        Err(reason) => Err(reason.into()),
    }
}

fn report_title(query: &str, metadata: &ResolvedMetadata, local_cover: Option<&Path>) {
    let cover = local_cover
        .map(Path::to_path_buf)
        .or_else(|| metadata.cover_path.clone());
    let cover_note = match cover {
        Some(path) => format!("cover={}", path.display()),
        None => "no cover".to_string(),
    };
    let status = metadata.status.as_deref().unwrap_or("unknown status");
    match metadata.rating {
        Some(rating) => {
            println!("{query}: '{}' [{status}, rated {rating}] {cover_note}", metadata.title)
        }
        None => println!("{query}: '{}' [{status}] {cover_note}", metadata.title),
    }
    if let Some(synopsis) = metadata.synopsis.as_deref() {
        let mut preview: String = synopsis.chars().take(160).collect();
        if preview.len() < synopsis.len() {
            preview.push('…');
        }
        println!("  {preview}");
    }
}
