use criterion::{black_box, criterion_group, criterion_main, Criterion};

use afc_ingest::{
    AntennaModelMap, FreqAssignment, FsDatabaseReader, LinkAssembler, LinkAssemblerConfig,
    TransmitterModelMap,
};

fn synthetic_database(licenses: usize) -> String {
    let mut out = String::new();
    for i in 0..licenses {
        let callsign = format!("WQAB{i:04}");
        let lat_min = 10 + (i % 40);
        out.push_str(&format!(
            "US:HD|{callsign}|A|CF|01/15/2020|01/15/2030|N\n\
             US:LO|{callsign}|1|40|{lat_min}|0.0|N|74|0|0.0|W|15.0\n\
             US:LO|{callsign}|2|40|{}|0.0|N|74|15|0.0|W|20.0\n\
             US:AN|{callsign}|1|1|30.0|38.6|HP8-59W||||1.2\n\
             US:AN|{callsign}|2|1|35.0|38.6|HP8-59W||||1.5\n\
             US:PA|{callsign}|1|1|1|2|1||N\n\
             US:FR|{callsign}|1|1|1|6093.45||55.0|0.03\n\
             US:EM|{callsign}|1|1|6093.45|30M0D7W\n",
            lat_min + 5
        ));
    }
    out
}

fn bench_assemble(c: &mut Criterion) {
    let antennas = AntennaModelMap::from_csv_strs(
        "Ant Model,Category,Diameter (m),Midband Gain (dBi)\nHP8-59W,HP,2.4,38.6\n",
        "regex,Ant Model\nHP8.*,HP8-59W\n",
    )
    .unwrap();
    let transmitters =
        TransmitterModelMap::from_csv_str("Model Prefix,Architecture\nMDR,IDU\n").unwrap();
    let freq = FreqAssignment::default();
    let db = synthetic_database(200);

    c.bench_function("parse_200_licenses", |b| {
        b.iter(|| {
            FsDatabaseReader::new(black_box(db.as_bytes()))
                .read_all()
                .unwrap()
        })
    });

    let records = FsDatabaseReader::new(db.as_bytes()).read_all().unwrap();
    c.bench_function("assemble_200_licenses", |b| {
        b.iter(|| {
            LinkAssembler::new(
                LinkAssemblerConfig::default(),
                &antennas,
                &transmitters,
                &freq,
            )
            .assemble(black_box(&records))
        })
    });
}

criterion_group!(benches, bench_assemble);
criterion_main!(benches);
