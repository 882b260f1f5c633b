// Copyright 2025 the Lume Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for the `lume_meta` property contract.
//!
//! These exercise round trips, the converter laws over a shared flags word,
//! reset idempotence and the no-partial-write guarantee through the public
//! API only.

use std::cell::Cell;
use std::rc::Rc;

use lume_meta::{
    Any, BitFlagConverter, Color, Converter, ConvertingValue, MetaError, Property,
    RenderSort, StaticValue, TypeId, ValueProvider, Vec3,
};

fn counter(property: &Property) -> Rc<Cell<u32>> {
    let count = Rc::new(Cell::new(0));
    let c = count.clone();
    property.on_changed().add_handler(move |_| c.set(c.get() + 1));
    count
}

fn enabled_over(flags: &Property, bit: u32) -> Property {
    let enabled = Property::new("Enabled", false);
    enabled
        .push_value(ConvertingValue::new(flags.clone(), BitFlagConverter::new(bit)))
        .unwrap();
    enabled
}

#[test]
fn round_trip_for_direct_properties() {
    let b = Property::new("Visible", false);
    b.set_value(true).unwrap();
    assert_eq!(b.get_value::<bool>(), Ok(true));

    let i = Property::new("Layer", 0_i32);
    i.set_value(-12).unwrap();
    assert_eq!(i.get_value::<i32>(), Ok(-12));

    let s = Property::new("Name", String::new());
    s.set_value(String::from("camera")).unwrap();
    assert_eq!(s.get_value::<String>(), Ok(String::from("camera")));

    let v = Property::new("Position", Vec3::ZERO);
    v.set_value(Vec3::new(1.0, 2.0, 3.0)).unwrap();
    assert_eq!(v.get_value::<Vec3>(), Ok(Vec3::new(1.0, 2.0, 3.0)));

    let c = Property::new("Tint", Color::WHITE);
    c.set_value(Color::new(0.1, 0.2, 0.3, 0.4)).unwrap();
    assert_eq!(c.get_value::<Color>(), Ok(Color::new(0.1, 0.2, 0.3, 0.4)));
}

#[test]
fn bit_converter_round_trips_the_bit_it_owns() {
    for bit in [0x1_u32, 0x2, 0x200, 0x8000_0000] {
        let converter = BitFlagConverter::new(bit);
        for flags in [0_u32, 1, 0x3, 0x201, 0xdead_beef, u32::MAX] {
            let source = converter.convert_to_source(&false, &flags);
            let target = converter.convert_to_target(&source, &flags);
            assert_eq!(target & bit, flags & bit, "bit {bit:#x} over {flags:#x}");
        }
    }
}

#[test]
fn sibling_bits_survive_each_other() {
    let flags = Property::new("EnableFlags", 0_u32);
    let first = enabled_over(&flags, 0x4);
    let second = enabled_over(&flags, 0x10);

    first.set_value(true).unwrap();
    let only_first = first.get_value::<bool>();
    second.set_value(true).unwrap();
    assert_eq!(first.get_value::<bool>(), only_first);
    second.set_value(false).unwrap();
    assert_eq!(first.get_value::<bool>(), Ok(true));
    assert_eq!(flags.get_value::<u32>(), Ok(0x4));
}

#[test]
fn second_reset_is_a_no_op() {
    let p = Property::new("Opacity", 1.0_f32);
    p.push_value(Rc::new(StaticValue::new(Any::new(0.25_f32))))
        .unwrap();
    let count = counter(&p);

    p.reset_value();
    let after_one = (p.get_value::<f32>(), p.stack_depth(), count.get());
    p.reset_value();
    let after_two = (p.get_value::<f32>(), p.stack_depth(), count.get());

    assert_eq!(after_one, (Ok(1.0), 1, 1));
    assert_eq!(after_one, after_two);
}

#[test]
fn converting_write_of_wrong_type_leaves_target_alone() {
    let flags = Property::new("EnableFlags", 0x55_u32);
    let enabled = enabled_over(&flags, 0x2);
    let count = counter(&flags);

    for wrong in [Any::new(1.0_f32), Any::new(String::from("on")), Any::new(2_u32)] {
        assert!(enabled.set_value_any(&wrong).is_err());
        assert_eq!(flags.get_value::<u32>(), Ok(0x55));
    }
    assert_eq!(count.get(), 0);
}

#[test]
fn converting_provider_reports_both_type_identities() {
    let flags = Property::new("EnableFlags", 0_u32);
    let provider: Rc<dyn ValueProvider> =
        ConvertingValue::new(flags, BitFlagConverter::new(0x1));
    assert!(provider.is_compatible(TypeId::of::<bool>()));
    assert!(provider.is_compatible(TypeId::of::<u32>()));
}

#[test]
fn render_sort_defaults_and_round_trips() {
    let sort = Property::new("RenderSort", RenderSort::default());
    assert_eq!(sort.get_value::<RenderSort>(), Ok(RenderSort::new(0, 0)));
    sort.set_value(RenderSort::new(2, 5)).unwrap();
    assert_eq!(sort.get_value::<RenderSort>(), Ok(RenderSort::new(2, 5)));
    assert!(matches!(
        sort.get_value::<u32>(),
        Err(MetaError::TypeMismatch { .. })
    ));
}
