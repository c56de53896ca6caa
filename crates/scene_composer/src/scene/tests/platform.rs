//! Composition of `resources/platform.go`: a scripted platform with a coin
//! factory, two kinematic collision objects and five sprites.

use crate::foundation::math::{Quat, Transform, Vec3};
use crate::scene::{ComponentKind, CompositionError, Declaration, SceneComposer, SceneTree};
use approx::assert_relative_eq;

const PLATFORM: &str = include_str!("../../../resources/platform.go");

fn platform() -> Declaration {
    Declaration::from_text(PLATFORM).expect("platform.go should parse")
}

fn composed() -> SceneTree {
    SceneComposer::standard()
        .compose(&platform())
        .expect("platform.go should compose")
}

#[test]
fn test_platform_structure() {
    let tree = composed();
    assert_eq!(tree.len(), 9);
    assert_eq!(tree.root().id(), "script");
    assert_eq!(tree.root().kind(), &ComponentKind::Script);

    let ids: Vec<&str> = tree.root().children().iter().map(|c| c.id()).collect();
    assert_eq!(
        ids,
        vec!["coin_factory", "collisionobject", "danger", "sprite", "sprite1", "sprite2", "sprite3", "sprite5"]
    );

    assert_eq!(tree.entities_of_kind(&ComponentKind::Sprite).count(), 5);
    assert_eq!(tree.entities_of_kind(&ComponentKind::CollisionObject).count(), 2);
    assert_eq!(tree.entities_of_kind(&ComponentKind::Factory).count(), 1);
}

#[test]
fn test_payloads_untouched() {
    let declaration = platform();
    let tree = composed();
    for descriptor in &declaration.embedded {
        let entity = tree.get(&descriptor.id).unwrap();
        assert_eq!(entity.payload(), &descriptor.config);
    }
    assert_eq!(tree.root().payload().as_str(), "/scripts/Platform.script");
}

#[test]
fn test_world_is_parent_world_composed_with_local() {
    let tree = composed();
    for (parent, entity) in tree.iter_with_parent() {
        let parent_world = parent.map_or_else(Transform::identity, |p| *p.world_transform());
        assert_eq!(*entity.world_transform(), parent_world.combine(entity.local_transform()));
    }
}

#[test]
fn test_collision_object_shares_root_position() {
    let tree = composed();
    let root = tree.root();
    assert_eq!(tree.get("collisionobject").unwrap().world_position(), root.world_position());
    assert_eq!(tree.get("danger").unwrap().world_position(), root.world_position());
}

#[test]
fn test_sprite_world_positions() {
    let tree = composed();
    assert_eq!(tree.get("sprite1").unwrap().world_position(), Vec3::new(-204.694_26, 0.0, -0.1));
    assert_eq!(tree.get("sprite5").unwrap().world_position(), Vec3::new(73.723_724, -86.0, -0.1));
}

#[test]
fn test_editor_rotations_kept_as_declared() {
    let tree = composed();

    let flipped = tree.get("sprite2").unwrap().local_rotation();
    assert_eq!(flipped.k, -1.0);
    assert_eq!(flipped.w, 3.749_399_4E-33);
    // (1, 0, 0) turned half way around z
    assert_relative_eq!(flipped * Vec3::x(), Vec3::new(-1.0, 0.0, 0.0), epsilon = 1e-6);

    let quarter = tree.get("sprite3").unwrap().world_rotation();
    assert_relative_eq!(
        quarter,
        Quat::from_axis_angle(&Vec3::z_axis(), std::f32::consts::FRAC_PI_2),
        epsilon = 1e-6
    );
}

#[test]
fn test_composition_is_deterministic() {
    let declaration = platform();
    let composer = SceneComposer::standard();
    let first = composer.compose(&declaration).unwrap();
    let second = composer.compose(&declaration).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_parallel_composition() {
    let declaration = platform();
    let composer = SceneComposer::standard();
    let expected = composer.compose(&declaration).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| composer.compose(&declaration).unwrap()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn test_renamed_sprite_collides() {
    let text = PLATFORM.replace("id: \"sprite1\"", "id: \"sprite\"");
    let declaration = Declaration::from_text(&text).unwrap();
    assert_eq!(
        SceneComposer::standard().compose(&declaration),
        Err(CompositionError::DuplicateId { id: "sprite".to_string() })
    );
}

#[test]
fn test_corrupted_payload_rejected() {
    let text = PLATFORM.replace("blend_mode: BLEND_MODE_ALPHA", "blend_mode: BLEND_MODE_NOPE");
    let declaration = Declaration::from_text(&text).unwrap();
    assert!(matches!(
        SceneComposer::standard().compose(&declaration),
        Err(CompositionError::MalformedPayload { id, .. }) if id == "sprite"
    ));
}
