//! Criterion benchmarks for enote construction and scanning.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use carrot_core::{
    AddressIndex, AddressIndexExtended, DeriveType, EnoteVariant, KeyImage, MasterSecret,
};
use carrot_keys::AccountDevices;
use carrot_stealth::{make_carrot_enote, EnoteScanner, PaymentProposal};

fn setup() -> (AccountDevices, AccountDevices) {
    let receiver = AccountDevices::from_master(&MasterSecret::from_array([1; 32])).unwrap();
    let stranger = AccountDevices::from_master(&MasterSecret::from_array([2; 32])).unwrap();
    (receiver, stranger)
}

fn proposal(devices: &AccountDevices) -> PaymentProposal {
    let destination = devices
        .address()
        .make_destination(&AddressIndexExtended::new(AddressIndex::new(0, 5), DeriveType::Auto))
        .unwrap();
    PaymentProposal::new(destination, 1_000)
}

fn bench_construct(c: &mut Criterion) {
    let (receiver, _) = setup();
    let proposal = proposal(&receiver);
    let l0 = KeyImage::from_array([9; 32]);

    let mut g = c.benchmark_group("construct");
    g.throughput(Throughput::Elements(1));
    g.bench_function("carrot_enote", |b| {
        b.iter(|| black_box(make_carrot_enote(&proposal, &l0).unwrap()));
    });
    g.finish();
}

fn bench_scan(c: &mut Criterion) {
    let (receiver, stranger) = setup();
    let l0 = KeyImage::from_array([9; 32]);
    let mine = EnoteVariant::Carrot(make_carrot_enote(&proposal(&receiver), &l0).unwrap().enote);
    let theirs = EnoteVariant::Carrot(make_carrot_enote(&proposal(&stranger), &l0).unwrap().enote);

    let scanner = EnoteScanner::new(&receiver);

    let mut g = c.benchmark_group("scan");
    g.throughput(Throughput::Elements(1));
    g.bench_function("view_tag_reject", |b| {
        b.iter(|| black_box(scanner.scan_enote(&theirs).unwrap()));
    });
    g.bench_function("owned", |b| {
        b.iter(|| black_box(scanner.scan_enote(&mine).unwrap()));
    });
    g.bench_function("owned_with_key_image", |b| {
        b.iter(|| black_box(scanner.scan_enote_full(&mine).unwrap()));
    });
    g.finish();
}

criterion_group!(benches, bench_construct, bench_scan);
criterion_main!(benches);
