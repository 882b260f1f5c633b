// Copyright 2025 the Lume Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end tests over scenes, post-processing and the kit wrappers.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use lume_meta::{
    ArrayProperty, Object, ObjectExt, ObjectPtr, ObjectRef, Property, RenderSort, same_object,
};
use lume_scene::{
    EcsObject, EffectObject, EffectsContainer, Node, ObjectKit, PostProcess, Scene, TONEMAP,
    VIGNETTE, World, effect_classes, init_dynamic_property, node_components,
};

fn post_process_of(camera: &dyn Object) -> ObjectPtr {
    camera
        .get_value::<ObjectRef>("PostProcess")
        .unwrap()
        .into_inner()
        .unwrap()
}

#[test]
fn effects_share_one_flags_word() {
    let scene = Scene::new().unwrap();
    let camera = scene.create_camera("main").unwrap();
    let post = post_process_of(&*camera);
    let post = post.as_any().downcast_ref::<PostProcess>().unwrap();
    let flags = scene
        .world()
        .property_at(camera.ecs().entity(), "PostProcessComponent.enableFlags")
        .unwrap();

    let tonemap = post.effect(&TONEMAP).unwrap();
    assert_eq!(tonemap.get_value::<bool>("Enabled"), Ok(false));
    tonemap.set_value("Enabled", true).unwrap();
    assert_eq!(flags.get_value::<u32>(), Ok(1));

    let vignette = post.effect(&VIGNETTE).unwrap();
    assert_eq!(vignette.get_value::<bool>("Enabled"), Ok(false));
    vignette.set_value("Enabled", true).unwrap();
    assert_eq!(flags.get_value::<u32>(), Ok(3));
    assert_eq!(tonemap.get_value::<bool>("Enabled"), Ok(true));
}

#[test]
fn engine_writes_show_through_enabled() {
    let scene = Scene::new().unwrap();
    let camera = scene.create_camera("main").unwrap();
    let post = post_process_of(&*camera);
    let post = post.as_any().downcast_ref::<PostProcess>().unwrap();
    let vignette = post.effect(&VIGNETTE).unwrap();
    let enabled = vignette.property("Enabled").unwrap();
    let changes = Rc::new(Cell::new(0));
    let c = changes.clone();
    enabled.on_changed().add_handler(move |_| c.set(c.get() + 1));

    let flags = scene
        .world()
        .property_at(camera.ecs().entity(), "PostProcessComponent.enableFlags")
        .unwrap();
    flags.set_value(0x2_u32).unwrap();
    assert_eq!(vignette.get_value::<bool>("Enabled"), Ok(true));
    assert_eq!(changes.get(), 1);

    // Toggling an unrelated bit leaves the observed value alone.
    flags.set_value(0x3_u32).unwrap();
    assert_eq!(changes.get(), 1);
}

#[test]
fn render_sort_round_trips_through_the_component() {
    let scene = Scene::new().unwrap();
    let node = scene.create_node("cube").unwrap();
    let untouched = scene.create_node("sphere").unwrap();

    node.set_value("RenderSort", RenderSort::new(2, 5)).unwrap();
    assert_eq!(
        node.get_value::<RenderSort>("RenderSort"),
        Ok(RenderSort::new(2, 5))
    );
    let field = scene
        .world()
        .property_at(node.ecs().entity(), "RenderSortComponent.renderSort")
        .unwrap();
    assert_eq!(field.get_value::<RenderSort>(), Ok(RenderSort::new(2, 5)));
    assert_eq!(
        untouched.get_value::<RenderSort>("RenderSort"),
        Ok(RenderSort::new(0, 0))
    );
}

#[test]
fn missing_component_reads_defaults() {
    let world = World::new();
    let entity = world.create_entity();
    let classes = Rc::new(effect_classes().unwrap());
    let post = PostProcess::new(classes, Some(EcsObject::new(&world, entity)));
    let tonemap = post.effect(&TONEMAP).unwrap();
    let effect = tonemap.as_any().downcast_ref::<EffectObject>().unwrap();

    assert!(!init_dynamic_property(effect, "Exposure"));
    assert!(!effect.dynamic().is_resolved("Exposure"));
    assert_eq!(tonemap.get_value::<f32>("Exposure"), Ok(0.7));
    assert!(tonemap.property("Nonexistent").is_none());

    let kit = ObjectKit::from(tonemap);
    assert!(!kit.get_property::<bool>("Nonexistent").is_valid());
    assert!(!kit.get_bool("Nonexistent"));
    assert_eq!(kit.get_u32("Nonexistent"), 0);
    assert_eq!(kit.get_string("Nonexistent"), "");
    assert!(!kit.set_value("Nonexistent", 1_u32));
}

#[test]
fn effects_container_orders_by_identity() {
    let scene = Scene::new().unwrap();
    let camera = scene.create_camera("main").unwrap();
    let classes = scene.classes();
    let a: ObjectPtr = classes.create(TONEMAP.class_id).unwrap();
    let b: ObjectPtr = classes.create(VIGNETTE.class_id).unwrap();
    let c: ObjectPtr = classes.create(TONEMAP.class_id).unwrap();

    let effects = EffectsContainer::from_object(&*camera, "Effects").unwrap();
    effects.append_child(a.clone());
    effects.append_child(b.clone());
    effects.insert_child_after(c.clone(), &a);
    let order: Vec<ObjectPtr> = (0..effects.child_count())
        .filter_map(|i| effects.get_child(i))
        .collect();
    assert_eq!(order.len(), 3);
    assert!(same_object(&order[0], &a));
    assert!(same_object(&order[1], &c));
    assert!(same_object(&order[2], &b));

    effects.remove_child(&c);
    assert_eq!(effects.child_count(), 2);
    assert!(same_object(&effects.get_child(0).unwrap(), &a));
    assert!(same_object(&effects.get_child(1).unwrap(), &b));

    // The camera property sees the same list.
    let list = ArrayProperty::<ObjectRef>::from_property(camera.property("Effects").unwrap());
    assert_eq!(list.unwrap().get_value().len(), 2);
}

#[test]
fn container_changes_coalesce_into_one_transition() {
    let effects = EffectsContainer::new(ArrayProperty::new("Effects", Vec::new()));
    let transitions = Rc::new(Cell::new(0));
    let t = transitions.clone();
    effects
        .modified()
        .on_changed()
        .add_handler(move |_| t.set(t.get() + 1));

    let classes = effect_classes().unwrap();
    for _ in 0..3 {
        effects.append_child(classes.create(TONEMAP.class_id).unwrap());
    }
    assert_eq!(transitions.get(), 1);

    effects.modified().mark_modified(false);
    effects.clear_children();
    effects.clear_children();
    assert_eq!(transitions.get(), 3);
    assert_eq!(effects.child_count(), 0);
}

#[test]
fn tasks_from_other_threads_run_on_the_scene_thread() {
    let scene = Scene::new().unwrap();
    let sender = scene.task_sender();
    let seen = Arc::new(AtomicU32::new(0));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let sender = sender.clone();
            let seen = seen.clone();
            std::thread::spawn(move || {
                sender.post(move |scene| {
                    let node = scene.create_node(&format!("node {i}")).unwrap();
                    node.set_value("RenderSort", RenderSort::new(i, 0)).unwrap();
                    seen.fetch_add(1, Ordering::SeqCst);
                });
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(sender.pending(), 4);
    assert_eq!(seen.load(Ordering::SeqCst), 0);
    assert_eq!(scene.process_tasks(), 4);
    assert_eq!(seen.load(Ordering::SeqCst), 4);
    assert_eq!(scene.world().entity_count(), 4);
}

#[test]
fn unbound_flags_still_toggle_locally() {
    let classes = Rc::new(effect_classes().unwrap());
    let post = PostProcess::new(classes, None);
    let tonemap = post.effect(&TONEMAP).unwrap();
    tonemap.set_value("Enabled", true).unwrap();
    assert_eq!(post.get_value::<u32>("EnableFlags"), Ok(1));

    let flags: Property = post.property("EnableFlags").unwrap();
    flags.reset_value();
    assert_eq!(tonemap.get_value::<bool>("Enabled"), Ok(false));
}

#[test]
fn short_lived_nodes_do_not_pile_up_on_engine_fields() {
    let world = World::new();
    let entity = world.create_entity();
    for component in node_components("shared") {
        world.add_component(entity, component).unwrap();
    }
    let name = world.property_at(entity, "NameComponent.name").unwrap();

    for _ in 0..100 {
        let node = Node::new(EcsObject::new(&world, entity));
        assert_eq!(node.get_value::<String>("Name"), Ok(String::from("shared")));
        assert_eq!(name.on_changed().handler_count(), 1);
    }
    assert_eq!(name.on_changed().handler_count(), 0);

    let kept = Node::new(EcsObject::new(&world, entity));
    kept.set_value("Name", String::from("renamed")).unwrap();
    assert_eq!(name.get_value::<String>(), Ok(String::from("renamed")));
    assert_eq!(name.on_changed().handler_count(), 1);
}
