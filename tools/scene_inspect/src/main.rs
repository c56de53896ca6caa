//! Compose a game object file and print the resulting entity tree

use anyhow::{bail, Context, Result};
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;

use scene_composer::foundation::logging;
use scene_composer::foundation::math::utils::euler_degrees;
use scene_composer::prelude::*;

fn main() -> Result<()> {
    logging::init_with_default("warn");

    let matches = Command::new("scene_inspect")
        .about("Composes a .go game object and prints its entity tree and registrations")
        .arg(
            Arg::new("file")
                .value_name("FILE")
                .help("Game object file to compose")
                .required(true),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Composer settings (.toml or .ron)"),
        )
        .arg(
            Arg::new("under")
                .short('u')
                .long("under")
                .value_name("X,Y,Z")
                .help("Place the root under a parent at this position")
                .allow_hyphen_values(true),
        )
        .arg(
            Arg::new("skip-payload-checks")
                .long("skip-payload-checks")
                .help("Don't check payloads of known component kinds")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let path = PathBuf::from(matches.get_one::<String>("file").context("FILE is required")?);

    let mut config = match matches.get_one::<String>("config") {
        Some(config_path) => ComposerConfig::load_from_file(config_path)
            .with_context(|| format!("Failed to load config {config_path}"))?,
        None => ComposerConfig::default(),
    };
    if matches.get_flag("skip-payload-checks") {
        config = config.with_payload_validation(false);
    }

    let parent = match matches.get_one::<String>("under") {
        Some(under) => Transform::from_position(parse_position(under)?),
        None => Transform::identity(),
    };

    let declaration = Declaration::from_file(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    let tolerance = config.rotation_tolerance;
    let composer = SceneComposer::standard().config(config).context("Invalid composer settings")?;
    let tree = composer
        .compose_under(&declaration, &parent)
        .with_context(|| format!("Failed to compose {}", path.display()))?;

    logging::info!("Composed {} entities from {}", tree.len(), path.display());
    print_tree(tree.root(), 0);

    let mut physics = PhysicsRegistrar::with_rotation_tolerance(tolerance);
    let mut render = RenderRegistrar::new();
    let mut spawn = SpawnRegistrar::new();
    let mut registrars: [&mut dyn Registrar; 3] = [&mut physics, &mut render, &mut spawn];
    register_all(&tree, &mut registrars).context("Registration failed")?;

    println!();
    println!("Physics bodies: {}", physics.bodies().len());
    for body in physics.bodies() {
        println!(
            "  {} {:?} group {:#06x} mask {:#06x} shapes {}",
            body.id,
            body.object_type,
            body.group.bits(),
            body.mask.bits(),
            body.shapes.len()
        );
    }
    println!("Sprites (draw order): {}", render.instances().len());
    for sprite in render.sorted_instances() {
        println!("  {} {} z {:.3}", sprite.id, sprite.animation, sprite.depth());
    }
    println!("Spawn points: {}", spawn.spawn_points().len());
    for point in spawn.spawn_points() {
        println!("  {} -> {}", point.id, point.prototype);
    }

    Ok(())
}

fn print_tree(entity: &Entity, depth: usize) {
    let position = entity.world_position();
    let (roll, pitch, yaw) = euler_degrees(&entity.world_rotation());
    println!(
        "{:indent$}{} [{}] pos ({:.4}, {:.4}, {:.4}) rot ({:.1}, {:.1}, {:.1})",
        "",
        entity.id(),
        entity.kind(),
        position.x,
        position.y,
        position.z,
        roll,
        pitch,
        yaw,
        indent = depth * 2
    );
    for child in entity.children() {
        print_tree(child, depth + 1);
    }
}

fn parse_position(text: &str) -> Result<Vec3> {
    let values = text
        .split(',')
        .map(|part| part.trim().parse::<f32>().with_context(|| format!("Invalid coordinate `{part}`")))
        .collect::<Result<Vec<f32>>>()?;
    match values.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => bail!("Expected X,Y,Z but got {} values", values.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_position() {
        assert_eq!(parse_position("1, -2.5,3").unwrap(), Vec3::new(1.0, -2.5, 3.0));
        assert!(parse_position("1,2").is_err());
        assert!(parse_position("a,b,c").is_err());
    }
}
