use clap::{Arg, ArgAction, Command};
use std::error::Error;
use std::path::PathBuf;
use std::{env, fs};

use syncr::config::{Config, SyncGroupConfig};
use syncr::engine::Engine;
use syncr::model::SyncMode;
use syncr::utils::lock::FileLock;

fn default_syncr_dir() -> PathBuf {
	match env::var("HOME") {
		Ok(home) => PathBuf::from(home).join(".syncr"),
		Err(_) => PathBuf::from(".syncr"),
	}
}

fn load_config(syncr_dir: &std::path::Path) -> Result<Config, Box<dyn Error>> {
	fs::create_dir_all(syncr_dir)?;
	Ok(Config::load(syncr_dir)?)
}

fn parse_mode(s: &str) -> Result<SyncMode, String> {
	s.parse::<SyncMode>()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
	syncr::logging::init_tracing();
	syncr::utils::lock::setup_signal_handlers();

	let matches = Command::new("syncr")
		.version("0.1.0")
		.about("Peer-to-peer directory synchronization")
		.subcommand_required(true)
		.arg(
			Arg::new("syncr-dir")
				.long("syncr-dir")
				.value_name("DIR")
				.help("Override the state/config directory (default: ~/.syncr)"),
		)
		.subcommand(
			Command::new("add")
				.about("Start tracking a directory as a sync group")
				.arg(Arg::new("path").required(true))
				.arg(Arg::new("sync-id").long("sync-id").value_name("ID"))
				.arg(
					Arg::new("mode")
						.long("mode")
						.value_name("MODE")
						.help("twoway|upload|download")
						.default_value("twoway"),
				)
				.arg(Arg::new("exclude").long("exclude").value_name("GLOB").action(ArgAction::Append))
				.arg(
					Arg::new("no-respect-ignore-files")
						.long("no-respect-ignore-files")
						.action(ArgAction::SetTrue),
				),
		)
		.subcommand(Command::new("list").about("List configured sync groups"))
		.subcommand(
			Command::new("status").about("Show file/byte counts for a sync group").arg(Arg::new("path").required(true)),
		)
		.subcommand(
			Command::new("conflicts")
				.about("List unresolved conflict artifacts for a sync group")
				.arg(Arg::new("path").required(true)),
		)
		.subcommand(
			Command::new("remove").about("Stop tracking a directory").arg(Arg::new("path").required(true)),
		)
		.get_matches();

	let syncr_dir =
		matches.get_one::<String>("syncr-dir").map(PathBuf::from).unwrap_or_else(default_syncr_dir);
	let mut config = load_config(&syncr_dir)?;

	if let Some(sub) = matches.subcommand_matches("add") {
		let path = fs::canonicalize(sub.get_one::<String>("path").expect("required"))?;
		let sync_id = sub
			.get_one::<String>("sync-id")
			.cloned()
			.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
		let mode = parse_mode(sub.get_one::<String>("mode").expect("has default"))?;
		let exclude_patterns: Vec<String> =
			sub.get_many::<String>("exclude").map(|vals| vals.cloned().collect()).unwrap_or_default();
		let respect_ignore_files = !sub.get_flag("no-respect-ignore-files");

		let mut group = SyncGroupConfig::new(sync_id.clone(), path.clone());
		group.mode = mode;
		group.exclude_patterns = exclude_patterns.clone();
		group.respect_ignore_files = respect_ignore_files;
		{
			let _lock = FileLock::acquire(&syncr_dir)?;
			config.upsert_group(group);
			config.save()?;
		}

		let engine = Engine::new();
		let handle = engine.add_group(path, sync_id.clone(), mode, exclude_patterns).await?;
		let stats = engine.get_stats(handle)?;
		println!("added sync group {} ({} files tracked)", sync_id, stats.file_count);
	} else if matches.subcommand_matches("list").is_some() {
		if config.groups.is_empty() {
			println!("no sync groups configured");
		}
		for group in &config.groups {
			println!("{}\t{}\t{:?}", group.sync_id, group.root.display(), group.mode);
		}
	} else if let Some(sub) = matches.subcommand_matches("status") {
		let path = fs::canonicalize(sub.get_one::<String>("path").expect("required"))?;
		let group = config
			.groups
			.iter()
			.find(|g| g.root == path)
			.ok_or("no sync group configured for that path")?
			.clone();

		let engine = Engine::new();
		let handle =
			engine.add_group(group.root.clone(), group.sync_id.clone(), group.mode, group.exclude_patterns).await?;
		let stats = engine.get_stats(handle)?;
		println!("sync-id: {}", group.sync_id);
		println!("mode: {:?}", group.mode);
		println!("files: {}", stats.file_count);
		println!("bytes: {}", stats.byte_count);
		println!("pending uploads: {}", stats.pending_uploads);
		println!("pending downloads: {}", stats.pending_downloads);
	} else if let Some(sub) = matches.subcommand_matches("conflicts") {
		let path = fs::canonicalize(sub.get_one::<String>("path").expect("required"))?;
		let group = config
			.groups
			.iter()
			.find(|g| g.root == path)
			.ok_or("no sync group configured for that path")?
			.clone();

		let engine = Engine::new();
		let handle =
			engine.add_group(group.root.clone(), group.sync_id.clone(), group.mode, group.exclude_patterns).await?;
		let conflicts = engine.list_conflicts(handle)?;
		if conflicts.is_empty() {
			println!("no unresolved conflicts");
		}
		for entry in conflicts {
			println!("{}\t{}\t{}", entry.path.display(), entry.peer_label, entry.unix_ms);
		}
	} else if let Some(sub) = matches.subcommand_matches("remove") {
		let path = fs::canonicalize(sub.get_one::<String>("path").expect("required"))?;
		let sync_id = config
			.groups
			.iter()
			.find(|g| g.root == path)
			.map(|g| g.sync_id.clone())
			.ok_or("no sync group configured for that path")?;
		{
			let _lock = FileLock::acquire(&syncr_dir)?;
			config.remove_group(&sync_id);
			config.save()?;
		}
		println!("removed sync group {}", sync_id);
	}

	Ok(())
}

// vim: ts=4
