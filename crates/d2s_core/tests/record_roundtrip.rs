use d2s_core::{
    CharacterClass, Corpse, DecodeOptions, Error, Golem, ItemList, SaveRecord, Status,
};

const NAME_OFFSET: usize = 0x14;
const STATUS_OFFSET: usize = 0x24;
const RESERVED_A_OFFSET: usize = 0x26;
const RESERVED_B_OFFSET: usize = 0x29;
const PREVIEW_NAME_OFFSET: usize = 0xBF + 0x4C;
const ATTRIBUTES_OFFSET: usize = 0x2FD;

fn item_list(count: u16, payload: &[u8]) -> ItemList {
    ItemList {
        count,
        payload: payload.to_vec(),
    }
}

/// An expansion character with a hired mercenary, one corpse and a golem.
fn sample_record() -> SaveRecord {
    let mut record = SaveRecord::new("Akara", CharacterClass::Sorceress);
    record.level = 42;
    record.created = 1_700_000_000;
    record.last_played = 1_700_003_600;
    record.play_time = 3600;
    record.status.set_hardcore(true);
    record.mercenary.id = 0x00C0_FFEE;
    record.mercenary.name_id = 7;
    record.mercenary.type_id = 3;
    record.mercenary.experience = 125_000;
    record.preview.expansion_experience = 9_000_000;
    record.quests.difficulties[0].words[1] = 0x1001;
    record.waypoints.difficulties[1].activated.set(9, true);
    record.npc_dialog.introductions[0] = 0x0000_00FF_0000_0001;
    record.class_skills.levels[0] = 20;
    record
        .attributes
        .set(0, 80)
        .expect("failed to set strength");
    record
        .attributes
        .set(13, 9_000_000)
        .expect("failed to set experience");
    record
        .attributes
        .set(7, 512 << 8)
        .expect("failed to set max life");
    record.player_items = item_list(2, &[0x10, 0x00, 0x80, 0x00, 0x05, 0xE4, 0x2F, 0x11, 0x22]);
    record.player_corpses.corpses.push(Corpse {
        reserved: 0,
        x: 0x1234,
        y: 0x5678,
        items: item_list(1, &[0x10, 0x08, 0x80, 0x00, 0x65, 0x00]),
    });
    record.enable_expansion();
    if let Some(mercenary_items) = record.mercenary_items.as_mut() {
        mercenary_items.items = Some(item_list(1, &[0x10, 0x00, 0xA0, 0x00, 0x65, 0x08]));
    }
    record.golem = Some(Golem {
        item: Some(vec![0x10, 0x00, 0x80, 0x00, 0x05, 0x64, 0xF4, 0x26]),
    });
    record
}

#[test]
fn status_byte_roundtrips_for_every_value() {
    for raw in 0..=u8::MAX {
        assert_eq!(Status::read(raw).bits(), raw);
    }
}

#[test]
fn status_hardcore_expansion_scenario() {
    let status = Status::read(0x24);
    assert!(status.is_hardcore());
    assert!(status.is_expansion());
    assert!(!status.is_newbie());
    assert!(!status.is_error());
    assert!(!status.is_dead());
    assert!(!status.is_save_in_progress());
    assert!(!status.is_ladder());
    assert!(!status.needs_renaming());
    assert_eq!(status.bits(), 0x24);

    let bytes = sample_record().encode().expect("failed to encode sample");
    assert_eq!(bytes[STATUS_OFFSET], 0x24);
}

#[test]
fn decoded_record_reencodes_byte_for_byte() {
    let bytes = sample_record().encode().expect("failed to encode sample");
    let decoded = SaveRecord::decode(&bytes).expect("failed to decode sample");

    assert_eq!(decoded.name, "Akara");
    assert_eq!(decoded.class(), CharacterClass::Sorceress);
    assert_eq!(decoded.level, 42);
    assert_eq!(decoded.mercenary.experience, 125_000);
    assert_eq!(decoded.attributes.get_by_name("strength"), Some(80));
    assert_eq!(decoded.class_skills.skill_id(0), Some(36));
    assert_eq!(decoded.player_corpses.corpses.len(), 1);
    assert_eq!(decoded.player_corpses.corpses[0].x, 0x1234);
    assert_eq!(decoded.header.file_size as usize, bytes.len());

    let reencoded = decoded.encode().expect("failed to re-encode sample");
    assert_eq!(reencoded, bytes);
}

#[test]
fn reserved_runs_are_preserved_verbatim() {
    let mut bytes = sample_record().encode().expect("failed to encode sample");
    bytes[RESERVED_A_OFFSET..RESERVED_A_OFFSET + 2].copy_from_slice(&[0xAB, 0xCD]);
    bytes[RESERVED_B_OFFSET..RESERVED_B_OFFSET + 2].copy_from_slice(&[0x01, 0x02]);
    d2s_core::Header::fix(&mut bytes).expect("failed to fix header");

    let decoded = SaveRecord::decode(&bytes).expect("failed to decode patched sample");
    assert_eq!(decoded.reserved_a, Some([0xAB, 0xCD]));
    assert_eq!(decoded.reserved_b, Some([0x01, 0x02]));
    assert_eq!(decoded.encode().expect("failed to re-encode"), bytes);
}

#[test]
fn fresh_record_writes_default_reserved_runs() {
    let bytes = SaveRecord::new("Kashya", CharacterClass::Amazon)
        .encode()
        .expect("failed to encode fresh record");
    assert_eq!(&bytes[RESERVED_A_OFFSET..RESERVED_A_OFFSET + 2], &[0x00, 0x00]);
    assert_eq!(&bytes[RESERVED_B_OFFSET..RESERVED_B_OFFSET + 2], &[0x10, 0x1E]);
}

#[test]
fn expansion_gating_changes_length_by_gated_sections() {
    let mut record = SaveRecord::new("Gheed", CharacterClass::Necromancer);
    let classic = record.encode().expect("failed to encode classic record");
    record.enable_expansion();
    let expansion = record.encode().expect("failed to encode expansion record");

    let (_, layout) = SaveRecord::decode_with_layout(&expansion, &DecodeOptions::default())
        .expect("failed to decode expansion record");
    let gated_bits: usize = layout
        .sections
        .iter()
        .filter(|section| {
            matches!(
                section.id,
                d2s_core::SectionId::MercenaryItems | d2s_core::SectionId::Golem
            )
        })
        .map(|section| section.range.len())
        .sum();
    assert_eq!((expansion.len() - classic.len()) * 8, gated_bits);

    let decoded = SaveRecord::decode(&classic).expect("failed to decode classic record");
    assert!(decoded.mercenary_items.is_none());
    assert!(decoded.golem.is_none());
}

#[test]
fn classic_record_omits_gated_sections_even_when_populated() {
    let mut record = sample_record();
    let with_sections = record.encode().expect("failed to encode");
    record.status = Status::read(record.status.bits() & !0x20);
    let without = record.encode().expect("failed to encode classic");

    // "jf" + mercenary list (4 + 6) + "kf" and flag + golem item (8)
    let gated = 2 + 4 + 6 + 3 + 8;
    assert_eq!(with_sections.len() - without.len(), gated);
    assert_eq!(
        without[STATUS_OFFSET + 1..],
        with_sections[STATUS_OFFSET + 1..without.len()]
    );
}

#[test]
fn fixed_width_text_fields() {
    let mut record = SaveRecord::new("ThisNameIsFarTooLongForTheField", CharacterClass::Paladin);
    record.preview.name = "x".repeat(100);
    let long = record.encode().expect("failed to encode long names");

    record.name = "Al".into();
    record.preview.name = String::new();
    let short = record.encode().expect("failed to encode short names");

    assert_eq!(long.len(), short.len());
    assert_eq!(&short[NAME_OFFSET..NAME_OFFSET + 16], b"Al\0\0\0\0\0\0\0\0\0\0\0\0\0\0");
    assert!(short[PREVIEW_NAME_OFFSET..PREVIEW_NAME_OFFSET + 64]
        .iter()
        .all(|&b| b == 0));
    assert_eq!(&long[NAME_OFFSET..NAME_OFFSET + 16], b"ThisNameIsFarToo");

    let decoded = SaveRecord::decode(&long).expect("failed to decode long names");
    assert_eq!(decoded.name, "ThisNameIsFarToo");
    assert_eq!(decoded.preview.name.len(), 64);
    assert_eq!(decoded.assigned_skills.len(), 16);
}

#[test]
fn truncated_buffers_fail() {
    let bytes = SaveRecord::new("Warriv", CharacterClass::Barbarian)
        .encode()
        .expect("failed to encode");
    for len in 0..bytes.len() {
        let result = SaveRecord::decode(&bytes[..len]);
        assert!(result.is_err(), "truncation to {len} bytes decoded");
        if (16..ATTRIBUTES_OFFSET).contains(&len) {
            assert!(
                matches!(result, Err(Error::BufferUnderrun { .. })),
                "truncation to {len} bytes: {result:?}"
            );
        }
    }
}

#[test]
fn rejects_invalid_signature() {
    let mut bytes = sample_record().encode().expect("failed to encode");
    bytes[0] = 0;
    assert!(matches!(
        SaveRecord::decode(&bytes),
        Err(Error::InvalidSignature { .. })
    ));
}

#[test]
fn classic_versions_stop_at_item_sections() {
    let mut record = SaveRecord::new("Charsi", CharacterClass::Barbarian);
    record.header.version = 0x60;
    let bytes = record.encode().expect("failed to encode 1.10 record");
    assert_eq!(
        SaveRecord::decode(&bytes),
        Err(Error::UnsupportedVersion {
            version: 0x60,
            section: "item list",
        })
    );
}

#[test]
fn checksum_is_only_verified_on_request() {
    let mut bytes = sample_record().encode().expect("failed to encode");
    bytes[NAME_OFFSET] = b'B';

    SaveRecord::decode(&bytes).expect("default decode should trust the checksum");
    assert!(matches!(
        SaveRecord::decode_with_options(&bytes, &DecodeOptions::strict()),
        Err(Error::ChecksumMismatch { .. })
    ));

    d2s_core::Header::fix(&mut bytes).expect("failed to fix header");
    let decoded = SaveRecord::decode_with_options(&bytes, &DecodeOptions::strict())
        .expect("fixed buffer should verify");
    assert_eq!(decoded.name, "Bkara");
}

#[test]
fn trailing_bytes_are_a_length_mismatch_unless_lenient() {
    let mut bytes = SaveRecord::new("Deckard", CharacterClass::Druid)
        .encode()
        .expect("failed to encode");
    bytes.extend_from_slice(&[0, 0]);

    // The classic corpse list must end the file.
    assert!(SaveRecord::decode(&bytes).is_err());

    let mut record = SaveRecord::new("Deckard", CharacterClass::Druid);
    record.enable_expansion();
    let mut bytes = record.encode().expect("failed to encode expansion");
    let expansion_total = bytes.len();
    bytes.extend_from_slice(&[0xEE; 3]);

    assert_eq!(
        SaveRecord::decode(&bytes),
        Err(Error::LengthMismatch {
            consumed_bits: expansion_total * 8,
            total_bits: (expansion_total + 3) * 8,
        })
    );
    let (decoded, layout) = SaveRecord::decode_with_layout(&bytes, &DecodeOptions::lenient())
        .expect("lenient decode should accept trailing bytes");
    assert_eq!(decoded.name, "Deckard");
    let trailing = layout
        .section(d2s_core::SectionId::Trailing)
        .expect("missing trailing range");
    assert_eq!(trailing.range.len(), 24);
}

#[test]
fn mercenary_and_preview_fields_land_on_file_offsets() {
    let mut record = SaveRecord::new("Qual", CharacterClass::Assassin);
    record.mercenary.is_dead = 1;
    record.mercenary.name_id = 0x0B0A;
    record.mercenary.type_id = 0x0D0C;
    record.preview.expansion_save_time = 0x0102_0304_0506_0708;
    record.preview.classic_save_time = 0x1112_1314_1516_1718;
    record.preview.torso = d2s_core::PreviewItem::with_code("qui");
    record.preview.head = d2s_core::PreviewItem::with_code("cap");
    let bytes = record.encode().expect("failed to encode");

    assert_eq!(&bytes[0xAF..0xB1], &[0x00, 0x00]);
    assert_eq!(&bytes[0xB1..0xB3], &[0x01, 0x00]);
    assert_eq!(&bytes[0xB7..0xBB], &[0x0A, 0x0B, 0x0C, 0x0D]);
    assert_eq!(bytes[0xBF], 0x08);
    assert_eq!(bytes[0xBF + 8], 0x18);
    // Items follow 28 bytes of times, color and experience: left, right, torso, head.
    assert_eq!(&bytes[0xBF + 28 + 24..0xBF + 28 + 28], b"qui\0");
    assert_eq!(&bytes[0xBF + 28 + 36..0xBF + 28 + 40], b"cap\0");
}

#[test]
fn golem_marker_in_mercenary_items_survives_decode() {
    let mut record = SaveRecord::new("Natalya", CharacterClass::Assassin);
    record.mercenary.id = 0x0BAD_F00D;
    record.enable_expansion();
    if let Some(mercenary_items) = record.mercenary_items.as_mut() {
        mercenary_items.items = Some(item_list(1, b"abkf\x01cd"));
    }
    let bytes = record.encode().expect("failed to encode");

    let decoded = SaveRecord::decode(&bytes).expect("failed to decode");
    assert_eq!(decoded.mercenary_items, record.mercenary_items);
    assert_eq!(decoded.golem, Some(Golem::default()));
}
