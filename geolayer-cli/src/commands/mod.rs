//! Command handlers for the GeoLayer CLI.

use std::io::Write;
use std::path::Path;

use geolayer::canvas::HeadlessCanvas;
use geolayer::client::{AsyncReqwestClient, BufferUnit, ImportFormat};
use geolayer::registry::LogicalLayer;
use geolayer::service::MapViewService;
use geolayer::style::Rgb;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use crate::error::CliError;

type Service = MapViewService<AsyncReqwestClient, HeadlessCanvas>;

/// Lists the tables in the configured schema.
pub async fn tables(service: &Service) -> Result<(), CliError> {
    let tables = service.list_tables().await?;
    if tables.is_empty() {
        println!("No tables in schema '{}'.", service.config().schema);
    } else {
        for table in tables {
            println!("{}", table);
        }
    }
    Ok(())
}

/// Deletes a table from the configured schema.
pub async fn delete_table(service: &Service, name: &str) -> Result<(), CliError> {
    service.delete_table(name).await?;
    println!("Table '{}' deleted.", name);
    Ok(())
}

/// Imports a file as a new table, then publishes it so the map server can
/// serve it.
pub async fn import(
    service: &Service,
    file: &Path,
    name: Option<&str>,
    format: ImportFormat,
) -> Result<(), CliError> {
    let table = match name {
        Some(name) => name.to_string(),
        None => file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| {
                CliError::InvalidArgument(format!(
                    "cannot derive a table name from '{}'; pass --name",
                    file.display()
                ))
            })?,
    };
    let file_name = file
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| table.clone());

    let bytes = tokio::fs::read(file).await.map_err(|error| CliError::FileRead {
        path: file.display().to_string(),
        error,
    })?;

    let message = service.import_file(&table, format, &file_name, bytes).await?;
    println!("Import: {}", message);

    let message = service.publish_service(&table).await?;
    println!("Publish: {}", message);
    Ok(())
}

/// Publishes an existing table as a servable layer.
pub async fn publish(service: &Service, table: &str) -> Result<(), CliError> {
    let message = service.publish_service(table).await?;
    println!("Publish: {}", message);
    Ok(())
}

/// Runs the interactive map-view session.
///
/// The layer registry lives for the duration of the session; `quit` tears
/// the view down.
pub async fn session(service: &Service) -> Result<(), CliError> {
    println!("GeoLayer interactive session. Type 'help' for commands, 'quit' to leave.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("geolayer> ");
        std::io::stdout().flush().ok();

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "failed to read input line");
                break;
            }
        };

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        if matches!(tokens[0], "quit" | "exit") {
            break;
        }

        // Session errors are reported inline; only I/O ends the loop
        if let Err(e) = dispatch(service, &tokens).await {
            eprintln!("Error: {}", e);
        }
    }

    service.teardown();
    println!("Session closed.");
    Ok(())
}

async fn dispatch(service: &Service, tokens: &[&str]) -> Result<(), CliError> {
    match tokens {
        ["help"] => {
            print_help();
            Ok(())
        }
        ["layers"] | ["list"] => {
            print_layers(&service.layers());
            Ok(())
        }
        ["tables"] => tables(service).await,
        ["add-vector", name] => {
            let category = service.add_vector_layer(name).await?;
            println!("Added vector layer '{}' ({}).", name, category);
            Ok(())
        }
        ["add-raster", name] => {
            service.add_raster_layer(name)?;
            println!("Added raster layer '{}'.", name);
            Ok(())
        }
        ["remove", name] => {
            service.remove_layer(name)?;
            println!("Removed layer '{}'.", name);
            Ok(())
        }
        ["show", name] => {
            service.set_visibility(name, true)?;
            Ok(())
        }
        ["hide", name] => {
            service.set_visibility(name, false)?;
            Ok(())
        }
        ["opacity", name, value] => {
            let opacity: f64 = value.parse().map_err(|_| {
                CliError::InvalidArgument(format!("'{}' is not a number", value))
            })?;
            service.set_opacity(name, opacity)?;
            Ok(())
        }
        ["color", name, value] => {
            let color = Rgb::parse(value).ok_or_else(|| {
                CliError::InvalidArgument(format!("'{}' is not a #RRGGBB color", value))
            })?;
            service.set_color(name, color)?;
            Ok(())
        }
        ["buffer", table, distance, unit, rest @ ..] => {
            let distance: f64 = distance.parse().map_err(|_| {
                CliError::InvalidArgument(format!("'{}' is not a number", distance))
            })?;
            let unit = parse_unit(unit)?;
            let layer = service
                .buffer(table, distance, unit, rest.first().copied())
                .await?;
            println!("Buffer result displayed as '{}'.", layer);
            Ok(())
        }
        ["clip", input, clip_layer, rest @ ..] => {
            let layer = service
                .clip(input, clip_layer, rest.first().copied())
                .await?;
            println!("Clip result displayed as '{}'.", layer);
            Ok(())
        }
        ["erase", target, erase_layer, rest @ ..] => {
            let layer = service
                .erase(target, erase_layer, rest.first().copied())
                .await?;
            println!("Erase result displayed as '{}'.", layer);
            Ok(())
        }
        _ => Err(CliError::InvalidArgument(format!(
            "unrecognized command '{}'; type 'help'",
            tokens.join(" ")
        ))),
    }
}

fn parse_unit(value: &str) -> Result<BufferUnit, CliError> {
    match value {
        "meters" | "m" => Ok(BufferUnit::Meters),
        "kilometers" | "km" => Ok(BufferUnit::Kilometers),
        other => Err(CliError::InvalidArgument(format!(
            "'{}' is not a distance unit (meters, kilometers)",
            other
        ))),
    }
}

fn print_layers(layers: &[LogicalLayer]) {
    if layers.is_empty() {
        println!("No layers in the current view.");
        return;
    }
    println!(
        "{:<24} {:<7} {:<9} {:<9} {:<8} {:<8} COLOR",
        "NAME", "KIND", "GEOMETRY", "STATUS", "VISIBLE", "OPACITY"
    );
    for layer in layers {
        println!(
            "{:<24} {:<7} {:<9} {:<9} {:<8} {:<8.2} {}",
            layer.name,
            layer.kind,
            layer
                .geometry
                .map(|g| g.as_str())
                .unwrap_or("-"),
            layer.status,
            if layer.visible { "yes" } else { "no" },
            layer.opacity,
            layer
                .color
                .map(|c| c.to_string())
                .unwrap_or_else(|| "(default)".to_string()),
        );
    }
}

fn print_help() {
    println!("Commands:");
    println!("  layers                                 list the layers in this view");
    println!("  tables                                 list the tables in the schema");
    println!("  add-vector <name>                      fetch and display a vector layer");
    println!("  add-raster <name>                      display a tiled raster layer");
    println!("  remove <name>                          remove a layer");
    println!("  show <name> | hide <name>              toggle layer visibility");
    println!("  opacity <name> <0..1>                  set layer opacity");
    println!("  color <name> <#RRGGBB>                 set layer color");
    println!("  buffer <table> <distance> <unit> [out] buffer a table and display the result");
    println!("  clip <input> <clip-layer> [out]        clip a layer and display the result");
    println!("  erase <target> <erase-layer> [out]     erase from a layer and display the result");
    println!("  quit                                   close the session");
}
