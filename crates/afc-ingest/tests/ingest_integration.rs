//! On-disk ingest fixtures: database file through reader, assembler, and
//! the anomaly sink.

use std::fs;
use std::io::Read;

use tempfile::TempDir;

use afc_core::codes::Region;
use afc_ingest::{
    AnomalySink, AntennaModelMap, FreqAssignment, FsDatabaseReader, LinkAssembler,
    LinkAssemblerConfig, TransmitterModelMap,
};

const ANT_LIST: &str = "\
# antenna catalog fixture
Ant Model,Category,Diameter (m),Midband Gain (dBi)
HP8-59W,HP,2.4,38.6
P6-65,B1,1.8,36.0
";

const ANT_MAP: &str = "\
regex,Ant Model
HP8.*,HP8-59W
P6.*,P6-65
";

const TX_LIST: &str = "\
Model Prefix,Architecture
MDR,IDU
";

const DATABASE: &str = "\
US:HD|WQAB123|A|CF|01/15/2020|01/15/2030|N
US:EN|WQAB123|Example Telecom LLC|0012345678
US:LO|WQAB123|1|40|30|0.0|N|74|0|0.0|W|15.0
US:LO|WQAB123|2|40|45|0.0|N|74|15|0.0|W|20.0
US:AN|WQAB123|1|1|30.0|38.6|HP8-59W||||1.2
US:AN|WQAB123|2|1|35.0|38.6|HP8-59W||||1.5
US:PA|WQAB123|1|1|1|2|1|WQCD456|N
US:FR|WQAB123|1|1|1|6093.45||55.0|0.03
US:EM|WQAB123|1|1|6093.45|30M0D7W
US:HD|WQZZ999|A|TP|01/15/2020|01/15/2030|N
US:LO|WQZZ999|1|40|10|0.0|N|73|50|0.0|W|5.0
US:LO|WQZZ999|2|40|20|0.0|N|73|55|0.0|W|5.0
US:AN|WQZZ999|1|1|20.0|30.0|P6-65||||1.0
US:AN|WQZZ999|2|1|20.0|30.0|P6-65||||1.0
US:PA|WQZZ999|1|1|1|2|1||N
US:FR|WQZZ999|1|1|1|6004.5||50.0|0.03
US:EM|WQZZ999|1|1|6004.5|10M0D7W
CA:SD|4587-001|CFX123|A|FX|45.50|-75.60|80.0|40.0|42.1|HP8-59W|60.0|45.60|-75.70|85.0|35.0|41.0|HP8-59W|1.5|6004.5|40.0
CA:PP|4587-001|45.550000|-75.650000|90.0|50.0|A|40.0|HP8-59W|10.0|0.0||
CA:PP|4587-001|45.550005|-75.650000|90.0|50.0|A|41.0|HP8-59W|190.0|0.0||
";

fn catalogs() -> (AntennaModelMap, TransmitterModelMap, FreqAssignment) {
    (
        AntennaModelMap::from_csv_strs(ANT_LIST, ANT_MAP).unwrap(),
        TransmitterModelMap::from_csv_str(TX_LIST).unwrap(),
        FreqAssignment::default(),
    )
}

#[test]
fn test_ingest_from_disk() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("fs_database.txt");
    fs::write(&db_path, DATABASE).unwrap();

    let records = FsDatabaseReader::open(&db_path).unwrap().read_all().unwrap();
    assert_eq!(records.len(), 20);

    let (antennas, transmitters, freq) = catalogs();
    let assembled = LinkAssembler::new(
        LinkAssemblerConfig::default(),
        &antennas,
        &transmitters,
        &freq,
    )
    .assemble(&records);

    // WQAB123 and the CA station survive; the TP service is filtered.
    assert_eq!(assembled.links.len(), 2);
    assert!(assembled
        .links
        .iter()
        .any(|l| l.region == Region::US && l.callsign == "WQAB123"));
    let ca = assembled
        .links
        .iter()
        .find(|l| l.region == Region::CA)
        .unwrap();
    assert_eq!(ca.passive_repeaters.len(), 1);

    assert_eq!(assembled.anomalies.len(), 1);
    assert_eq!(assembled.anomalies[0].callsign, "WQZZ999");
    assert!(assembled.anomalies[0]
        .reason
        .contains("Radio service value of TP"));
}

#[test]
fn test_anomaly_file_written() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("fs_database.txt");
    fs::write(&db_path, DATABASE).unwrap();

    let records = FsDatabaseReader::open(&db_path).unwrap().read_all().unwrap();
    let (antennas, transmitters, freq) = catalogs();
    let assembled = LinkAssembler::new(
        LinkAssemblerConfig::default(),
        &antennas,
        &transmitters,
        &freq,
    )
    .assemble(&records);

    let anomaly_path = dir.path().join("anomalous.csv");
    let sink = AnomalySink::new(fs::File::create(&anomaly_path).unwrap()).unwrap();
    for record in &assembled.anomalies {
        sink.write(record).unwrap();
    }
    sink.into_inner().unwrap().sync_all().unwrap();

    let mut text = String::new();
    fs::File::open(&anomaly_path)
        .unwrap()
        .read_to_string(&mut text)
        .unwrap();
    assert!(text.starts_with("Region,Callsign,Record Type,Reason"));
    assert!(text.contains("WQZZ999"));
}

#[test]
fn test_keep_mobile_retains_tp_service() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("fs_database.txt");
    fs::write(&db_path, DATABASE).unwrap();

    let records = FsDatabaseReader::open(&db_path).unwrap().read_all().unwrap();
    let (antennas, transmitters, freq) = catalogs();
    let assembled = LinkAssembler::new(
        LinkAssemblerConfig {
            remove_mobile: false,
            ..Default::default()
        },
        &antennas,
        &transmitters,
        &freq,
    )
    .assemble(&records);

    assert_eq!(assembled.links.len(), 3);
    assert!(assembled.anomalies.is_empty());
}
