//! A small single-patient export shaped like the bundled configuration
//! expects.

#![allow(dead_code)]

use recon_core::Scalar;
use recon_source::Dataset;

pub const PATIENT: &str = "Z7004242";
pub const ENC_HISTORY: i64 = 799_951_565;
pub const ENC_LIPIDS: i64 = 802_802_103;
pub const ENC_LAB: i64 = 802_802_200;
pub const PARENT_ORDER: i64 = 945_468_368;
pub const CHILD_ORDER: i64 = 945_468_371;

fn int(v: i64) -> Scalar {
    Scalar::Int(v)
}

fn text(v: &str) -> Scalar {
    Scalar::Text(v.to_string())
}

struct Builder {
    ds: Dataset,
    reverse: bool,
}

impl Builder {
    fn table(&mut self, name: &str, columns: &[&str], mut rows: Vec<Vec<Scalar>>) {
        if self.reverse {
            rows.reverse();
        }
        self.ds
            .insert(name, columns.iter().map(ToString::to_string).collect(), rows)
            .unwrap();
    }
}

/// The fixture export.
pub fn export() -> Dataset {
    build(false)
}

/// The same export with every table's rows in reverse order.
pub fn export_reversed() -> Dataset {
    build(true)
}

/// The fixture export without `table`.
pub fn export_without(table: &str) -> Dataset {
    let mut ds = export();
    ds.remove(table);
    ds
}

#[allow(clippy::too_many_lines)]
fn build(reverse: bool) -> Dataset {
    let mut b = Builder {
        ds: Dataset::new(),
        reverse,
    };

    b.table(
        "PATIENT",
        &["PAT_ID", "PAT_NAME", "BIRTH_DATE"],
        vec![
            vec![text(PATIENT), text("DOE,JANE"), text("2/14/1970 12:00:00 AM")],
            vec![text("Z0000001"), text("ROE,RICHARD"), Scalar::Null],
        ],
    );
    b.table(
        "PATIENT_2",
        &["PAT_ID", "RECORD_TYPE_C"],
        vec![vec![text(PATIENT), int(1)]],
    );

    // Encounters, with one split member joined on a renamed column.
    b.table(
        "PAT_ENC",
        &[
            "PAT_ID",
            "PAT_ENC_CSN_ID",
            "CONTACT_DATE",
            "DEPARTMENT_ID",
            "VISIT_PROV_ID",
        ],
        vec![
            vec![
                text(PATIENT),
                int(ENC_HISTORY),
                text("8/9/2018 12:00:00 AM"),
                int(1_700_801),
                text("144590"),
            ],
            vec![
                text(PATIENT),
                int(ENC_LIPIDS),
                text("9/28/2023 12:00:00 AM"),
                int(1_700_801),
                text("144590"),
            ],
            vec![
                text(PATIENT),
                int(ENC_LAB),
                text("9/29/2023 12:00:00 AM"),
                int(1_700_802),
                Scalar::Null,
            ],
            vec![
                text("Z0000001"),
                int(111),
                text("1/1/2020 12:00:00 AM"),
                Scalar::Null,
                Scalar::Null,
            ],
        ],
    );
    b.table(
        "PAT_ENC_3",
        &["PAT_ENC_CSN", "BP_SYSTOLIC", "BP_DIASTOLIC"],
        vec![
            vec![text("802802103"), int(121), int(78)],
            vec![text("799951565"), int(118), int(76)],
        ],
    );
    b.table(
        "PAT_ENC_DX",
        &["PAT_ENC_CSN_ID", "LINE", "DX_ID", "PRIMARY_DX_YN"],
        vec![
            vec![int(ENC_LIPIDS), int(1), int(260), text("Y")],
            vec![int(ENC_LIPIDS), int(2), int(513), text("N")],
        ],
    );
    b.table(
        "HNO_INFO",
        &["NOTE_ID", "PAT_ENC_CSN_ID", "NOTE_TYPE"],
        vec![vec![text("1473"), int(ENC_LIPIDS), text("Progress Notes")]],
    );

    // Orders: the parent on the lipids visit, the child on the lab visit.
    b.table(
        "ORDER_PROC",
        &[
            "ORDER_PROC_ID",
            "PAT_ID",
            "PAT_ENC_CSN_ID",
            "DESCRIPTION",
            "PROC_ID",
            "AUTHRZING_PROV_ID",
        ],
        vec![
            vec![
                int(PARENT_ORDER),
                text(PATIENT),
                int(ENC_LIPIDS),
                text("LIPID PANEL"),
                int(23_868),
                text("144590"),
            ],
            vec![
                int(CHILD_ORDER),
                text(PATIENT),
                int(ENC_LAB),
                text("LIPID PANEL"),
                int(23_868),
                text("144590"),
            ],
        ],
    );
    b.table(
        "ORDER_PROC_3",
        &["ORDER_ID", "SPECIMEN_TYPE"],
        vec![
            vec![int(PARENT_ORDER), text("Blood")],
            vec![int(CHILD_ORDER), text("Blood")],
        ],
    );
    b.table(
        "ORDER_RESULTS",
        &["ORDER_PROC_ID", "LINE", "COMPONENT", "ORD_VALUE"],
        vec![
            vec![int(CHILD_ORDER), int(1), text("CHOLESTEROL"), text("159")],
            vec![int(CHILD_ORDER), int(2), text("HDL"), text("62")],
        ],
    );
    b.table(
        "ORDER_PARENT_INFO",
        &["ORDER_ID", "PARENT_ORDER_ID", "PAT_ENC_CSN_ID"],
        vec![
            vec![int(CHILD_ORDER), int(PARENT_ORDER), int(ENC_LIPIDS)],
            vec![int(PARENT_ORDER), int(PARENT_ORDER), int(ENC_LIPIDS)],
        ],
    );
    b.table(
        "ORDER_COMMENT",
        &["ORDER_ID", "LINE", "ORDERING_COMMENT"],
        vec![vec![int(PARENT_ORDER), int(1), text("Fasting 12 hours")]],
    );

    // Patient-level entities.
    b.table(
        "ALLERGY",
        &["ALLERGY_ID", "ALLERGEN_NAME", "ALLERGY_PAT_CSN"],
        vec![
            vec![int(58_554), text("PENICILLINS"), int(ENC_HISTORY)],
            vec![int(99_999), text("SOMEONE ELSE'S"), Scalar::Null],
        ],
    );
    b.table(
        "PAT_ALLERGIES",
        &["PAT_ID", "LINE", "ALLERGY_RECORD_ID"],
        vec![vec![text(PATIENT), int(1), int(58_554)]],
    );
    b.table(
        "PROBLEM_LIST",
        &["PROBLEM_LIST_ID", "PAT_ID", "DX_ID", "PROBLEM_EPT_CSN"],
        vec![vec![int(87_654), text(PATIENT), int(260), int(ENC_LIPIDS)]],
    );
    b.table(
        "IMMUNE",
        &["IMMUNE_ID", "IMMUNZATN_ID", "IMMUNE_DATE"],
        vec![vec![int(4_441), int(121), text("10/1/2022 12:00:00 AM")]],
    );
    b.table(
        "ARPB_VISITS",
        &["PB_VISIT_ID", "PAT_ID", "PRIM_ENC_CSN_ID"],
        vec![
            vec![int(5_001), text(PATIENT), int(ENC_LIPIDS)],
            vec![int(5_002), text(PATIENT), int(424_242)],
        ],
    );

    // History snapshots.
    b.table(
        "SOCIAL_HX",
        &[
            "PAT_ID",
            "PAT_ENC_CSN_ID",
            "HX_LNK_ENC_CSN",
            "CONTACT_DATE",
            "TOBACCO_USER_C",
        ],
        vec![
            vec![
                text(PATIENT),
                int(ENC_LIPIDS),
                int(ENC_HISTORY),
                text("9/28/2023 12:00:00 AM"),
                text("Never"),
            ],
            vec![
                text(PATIENT),
                int(700_000_001),
                Scalar::Null,
                text("1/5/2019 12:00:00 AM"),
                text("Former"),
            ],
        ],
    );

    // Dimension tables.
    b.table(
        "CLARITY_SER",
        &["PROV_ID", "PROV_NAME"],
        vec![vec![text("144590"), text("RAMMELKAMP, ZOE")]],
    );
    b.table(
        "CLARITY_DEP",
        &["DEPARTMENT_ID", "DEPARTMENT_NAME"],
        vec![
            vec![int(1_700_801), text("ASSOCIATED PHYSICIANS")],
            vec![int(1_700_802), text("LAB DRAW")],
        ],
    );
    b.table(
        "CLARITY_EDG",
        &["DX_ID", "DX_NAME"],
        vec![
            vec![int(260), text("Hyperlipidemia")],
            vec![int(513), text("Fatigue")],
        ],
    );
    b.table(
        "CLARITY_EAP",
        &["PROC_ID", "PROC_NAME"],
        vec![vec![int(23_868), text("LIPID PANEL")]],
    );

    b.ds
}
