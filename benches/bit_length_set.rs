//! Benchmark: bit-length set algebra on the shapes that dominate real definitions.
//! Pointwise sums of wide sets, nested variable-length arrays (repeat_range) and
//! full structure/union construction over those arrays.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dsdlcore::{
    BitLengthSet, CastMode, CompositeType, DataType, Declaration, Field, SerializableType, UnsignedIntegerType,
    VariableLengthArrayType, Version,
};
use std::sync::Arc;

fn u8_type() -> DataType {
    UnsignedIntegerType::new(8, CastMode::Truncated).expect("uint8").into()
}

/// `uint8[<=inner][<=outer]`
fn nested_array(inner: u64, outer: u64) -> DataType {
    let inner = VariableLengthArrayType::new(u8_type(), inner).expect("inner array");
    VariableLengthArrayType::new(inner.into(), outer).expect("outer array").into()
}

fn structure_of(name: &str, count: usize, field_type: &DataType, union: bool) -> Arc<CompositeType> {
    let declaration = Declaration::new(name, Version::new(1, 0))
        .with_attributes((0..count).map(|i| Field::new(field_type.clone(), format!("f{}", i))))
        .with_final(true);
    if union {
        CompositeType::union(declaration).expect("union")
    } else {
        CompositeType::structure(declaration).expect("structure")
    }
}

fn bench_bit_length_set(c: &mut Criterion) {
    let wide: BitLengthSet = (0..=2048).step_by(8).collect();
    let narrow = BitLengthSet::from([0, 8, 16, 24]);
    eprintln!("bit_length_set: wide {} lengths, narrow {} lengths", wide.len(), narrow.len());

    c.bench_function("pointwise_sum_wide_narrow", |b| {
        b.iter(|| black_box(black_box(&wide) + black_box(&narrow)))
    });

    c.bench_function("pad_to_alignment_32", |b| {
        b.iter(|| black_box(black_box(&wide) + 3).padded_to(32))
    });

    c.bench_function("repeat_range_16", |b| {
        b.iter(|| black_box(&narrow).repeat_range(black_box(16)))
    });

    c.bench_function("nested_variable_length_array", |b| {
        b.iter(|| black_box(nested_array(black_box(16), black_box(8))).bit_length_set())
    });

    let element = nested_array(8, 4);
    eprintln!("element: {} ({} lengths)", element, element.bit_length_set().len());

    c.bench_function("structure_of_nested_arrays", |b| {
        b.iter(|| black_box(structure_of("bench.S", 4, black_box(&element), false)).extent())
    });

    c.bench_function("union_of_nested_arrays", |b| {
        b.iter(|| black_box(structure_of("bench.U", 4, black_box(&element), true)).extent())
    });

    let s = structure_of("bench.S", 4, &element, false);
    c.bench_function("iterate_fields_with_offsets", |b| {
        b.iter(|| {
            let offsets = s.iterate_fields_with_offsets(None).expect("serializable");
            black_box(offsets.map(|(_, offset)| offset.len()).sum::<usize>())
        })
    });
}

criterion_group!(benches, bench_bit_length_set);
criterion_main!(benches);
