use rsi_import::{
	catalog::CatalogClient,
	decoder::ProcessDecoder,
	http::{ArcTransport, Endpoints, UreqTransport},
	scene::{scene_channel, MemoryScene},
	utility::{get_named_arg, has_flag},
	CancelToken, ImportError, Importer, Settings,
};
use std::{path::PathBuf, sync::Arc};

mod args;
use args::Command;

mod obj;

static DEFAULT_SETTINGS: &str = "rsi-browser.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let settings_path = get_named_arg("settings")
		.map(PathBuf::from)
		.unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS));
	let mut settings = Settings::load(&settings_path)?;
	settings.apply_overrides()?;
	init_logging(&settings);

	let command = Command::parse(std::env::args().skip(1))?;
	let transport: ArcTransport = Arc::new(UreqTransport::new(&settings.user_agent, settings.timeout()));

	let result = match command {
		Command::Search(term) => search(&settings, transport, &term).await,
		Command::Info(item_id) => info(&settings, transport, &item_id).await,
		Command::Import(item_id) => import(&settings, transport, &item_id).await,
	};
	if let Err(err) = result {
		log::error!("{}", err.report());
		std::process::exit(1);
	}
	Ok(())
}

fn init_logging(settings: &Settings) {
	let level = match settings.debug {
		true => "debug",
		false => "info",
	};
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
		.format_timestamp_millis()
		.init();
}

async fn search(settings: &Settings, transport: ArcTransport, term: &str) -> Result<(), ImportError> {
	let client = CatalogClient::new(transport, Endpoints::new(settings.api_root.clone()))
		.with_limit(settings.search_limit);
	let items = client.search(term).await?;
	if has_flag("json") {
		print_json(&items);
		return Ok(());
	}
	if items.is_empty() {
		println!("Nothing in the catalog matches \"{term}\"");
	}
	for item in items.iter() {
		println!("{:>6}  {}", item.id, item.display_name);
	}
	Ok(())
}

async fn info(settings: &Settings, transport: ArcTransport, item_id: &str) -> Result<(), ImportError> {
	let importer = Importer::new(transport, decoder(settings), settings);
	let manifest = importer.resolve(item_id).await?;
	println!("{} (#{})", manifest.display_name, manifest.item_id);
	let details = &manifest.details;
	let rows = [
		("manufacturer", details.manufacturer.clone()),
		("type", details.kind.clone()),
		("focus", details.focus.clone()),
		("size", details.size.clone()),
		("crew", details.crew()),
		("website", details.page_url.clone()),
	];
	for (label, value) in rows {
		if let Some(value) = value {
			println!("  {label}: {value}");
		}
	}
	if let Some(dimensions) = manifest.dimensions {
		println!(
			"  dimensions: {} x {} x {} m (beam x length x height)",
			dimensions.beam, dimensions.length, dimensions.height
		);
	}
	for geometry in manifest.geometry_refs.iter() {
		println!("  geometry [{}] {}", geometry.format, geometry.locator);
	}
	for material in manifest.material_refs.iter() {
		println!(
			"  material {} {}",
			material.name,
			material.texture_ref.as_deref().unwrap_or("")
		);
	}
	for group in manifest.submesh_groups.iter().flatten() {
		println!("  submesh {} {:?}", group.name, group.selection);
	}
	Ok(())
}

async fn import(settings: &Settings, transport: ArcTransport, item_id: &str) -> Result<(), ImportError> {
	let importer = Importer::new(transport, decoder(settings), settings);
	let cancel = CancelToken::new();
	let (sender, mut receiver) = scene_channel(1);
	let mut scene = MemoryScene::default();

	let import = importer.import(item_id, &sender, &cancel);
	tokio::pin!(import);
	// This task is the scene's owner, so it applies the hand-off while the import runs.
	let materialized = loop {
		tokio::select! {
			result = &mut import => break result?,
			Some(request) = receiver.recv() => request.apply(&mut scene),
			_ = tokio::signal::ctrl_c(), if !cancel.is_cancelled() => {
				log::warn!("Cancelling import of #{item_id}");
				cancel.cancel();
			}
		}
	};

	for object in scene.objects() {
		println!(
			"{}: {} vertices, {} triangles, scale {:?}",
			object.name,
			object.mesh.vertex_count(),
			object.mesh.triangle_count(),
			[object.scale.x, object.scale.y, object.scale.z]
		);
	}
	log::info!("Imported {} object(s)", materialized.objects.len());

	if let Some(dir) = get_named_arg("obj") {
		if let Err(err) = obj::dump_scene(&scene, &PathBuf::from(dir)) {
			log::error!("Failed to write obj files: {err:#}");
		}
	}
	Ok(())
}

fn decoder(settings: &Settings) -> Arc<ProcessDecoder> {
	Arc::new(
		ProcessDecoder::new(settings.decoder.program.clone())
			.with_args(settings.decoder.args.clone())
			.with_formats(settings.decoder.formats.clone()),
	)
}

fn print_json<T: serde::Serialize>(value: &T) {
	match serde_json::to_string_pretty(value) {
		Ok(json) => println!("{json}"),
		Err(err) => log::error!("Failed to serialize output: {err}"),
	}
}
