// Copyright 2025 the Lume Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `lume_meta` properties and `lume_scene` resolution.

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use std::rc::Rc;
use std::sync::Once;

use lume_meta::{
    Any, BitFlagConverter, ConvertingValue, ForwardingValue, ObjectExt, ObjectRef, Property,
    StaticValue, Value,
};
use lume_scene::{PostProcess, Scene, TONEMAP};

fn enabled_over(flags: &Property, bit: u32) -> Property {
    let enabled = Property::new("Enabled", false);
    enabled
        .push_value(ConvertingValue::new(flags.clone(), BitFlagConverter::new(bit)))
        .unwrap();
    enabled
}

fn bench_property(c: &mut Criterion) {
    static PRINT_SIZES: Once = Once::new();
    PRINT_SIZES.call_once(|| {
        eprintln!(
            "sizes: Any={} Value={} Property={}",
            core::mem::size_of::<Any>(),
            core::mem::size_of::<Value>(),
            core::mem::size_of::<Property>(),
        );
    });

    let mut group = c.benchmark_group("property/get");

    group.bench_function("default", |b| {
        let p = Property::new("Exposure", 0.7_f32);
        b.iter(|| black_box(p.get_value::<f32>()))
    });

    group.bench_function("stored", |b| {
        let p = Property::new("Exposure", 0.7_f32);
        p.set_value(1.5_f32).unwrap();
        b.iter(|| black_box(p.get_value::<f32>()))
    });

    group.bench_function("static", |b| {
        let p = Property::new("Exposure", 0.7_f32);
        p.push_value(Rc::new(StaticValue::new(Any::new(2.0_f32))))
            .unwrap();
        b.iter(|| black_box(p.get_value::<f32>()))
    });

    group.bench_function("forwarding", |b| {
        let field = Property::new("exposure", 0.7_f32);
        let p = Property::new("Exposure", 0.7_f32);
        p.push_value(ForwardingValue::new(field)).unwrap();
        b.iter(|| black_box(p.get_value::<f32>()))
    });

    group.bench_function("converting", |b| {
        let flags = Property::new("EnableFlags", 0x3_u32);
        let enabled = enabled_over(&flags, 0x2);
        b.iter(|| black_box(enabled.get_value::<bool>()))
    });

    group.bench_function("bound", |b| {
        let source = Property::new("Exposure", 0.7_f32);
        let p = Property::new("Exposure", 0.0_f32);
        p.bind(&source).unwrap();
        b.iter(|| black_box(p.get_value::<f32>()))
    });

    group.finish();

    let mut group = c.benchmark_group("property/set");

    group.bench_function("stored/no_listener", |b| {
        let p = Property::new("Exposure", 0.0_f32);
        let mut v = 0.0_f32;
        b.iter(|| {
            v += 1.0;
            black_box(p.set_value(v))
        })
    });

    group.bench_function("stored/with_listener", |b| {
        let p = Property::new("Exposure", 0.0_f32);
        p.on_changed().add_handler(|p| {
            black_box(p.name());
        });
        let mut v = 0.0_f32;
        b.iter(|| {
            v += 1.0;
            black_box(p.set_value(v))
        })
    });

    group.bench_function("converting/siblings", |b| {
        let flags = Property::new("EnableFlags", 0_u32);
        let bits: Vec<Property> = (0..8).map(|i| enabled_over(&flags, 1 << i)).collect();
        let mut on = false;
        b.iter(|| {
            on = !on;
            for enabled in &bits {
                black_box(enabled.set_value(on)).unwrap();
            }
        })
    });

    group.finish();

    let mut group = c.benchmark_group("scene/resolve");

    group.bench_function("camera/first_lookup", |b| {
        let scene = Scene::new().unwrap();
        b.iter_batched(
            || scene.create_camera("bench").unwrap(),
            |camera| black_box(camera.get_value::<f32>("FoV")),
            BatchSize::SmallInput,
        )
    });

    group.bench_function("camera/resolved", |b| {
        let scene = Scene::new().unwrap();
        let camera = scene.create_camera("bench").unwrap();
        b.iter(|| black_box(camera.get_value::<f32>("FoV")))
    });

    group.bench_function("effect/enabled", |b| {
        let scene = Scene::new().unwrap();
        let camera = scene.create_camera("bench").unwrap();
        let post = camera
            .get_value::<ObjectRef>("PostProcess")
            .unwrap()
            .into_inner()
            .unwrap();
        let post = post.as_any().downcast_ref::<PostProcess>().unwrap();
        let tonemap = post.effect(&TONEMAP).unwrap();
        let mut on = false;
        b.iter(|| {
            on = !on;
            black_box(tonemap.set_value("Enabled", on)).unwrap();
        })
    });

    group.finish();
}

criterion_group!(benches, bench_property);
criterion_main!(benches);
