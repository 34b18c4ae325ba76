//! Integration tests for the auto-fill engine
//!
//! Fixture PDFs are built in memory with lopdf.

use lopdf::{dictionary, Document, Object, ObjectId};
use mapping::{Coordinate, DataField, FieldMapping, FileStore, MappingStore, MemoryStore};
use pdf_core::{FontData, PdfDocument};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use template::{
    ApplicationData, AutoFiller, BytesTemplateSource, FileTemplateSource, FillConfig,
    MappingSource, Registry, TemplateError,
};

/// TrueType fixture with glyphs for A, B, C and U+3042
const TEST_TTF: &[u8] = include_bytes!("../../pdf-core/tests/fixtures/hoiku-test.ttf");

/// Minimal PDF with `page_count` US Letter pages
fn create_test_pdf(page_count: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut page_ids = Vec::new();
    for _ in 0..page_count {
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => dictionary! {},
        });
        page_ids.push(page_id);
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => page_count as i64,
            "Kids" => page_ids.into_iter().map(Object::Reference).collect::<Vec<_>>(),
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// One-page PDF with text fields; "a.b" creates field "b" under parent "a"
fn create_form_pdf(field_names: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        "Resources" => dictionary! {},
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => 1,
            "Kids" => vec![Object::Reference(page_id)],
        }),
    );

    let mut top_level: Vec<Object> = Vec::new();
    let mut parents: Vec<(String, ObjectId, Vec<Object>)> = Vec::new();

    for name in field_names {
        match name.split_once('.') {
            Some((parent, child)) => {
                let index = match parents.iter().position(|(p, _, _)| p == parent) {
                    Some(index) => index,
                    None => {
                        parents.push((parent.to_string(), doc.new_object_id(), Vec::new()));
                        parents.len() - 1
                    }
                };
                let parent_id = parents[index].1;
                let id = doc.add_object(dictionary! {
                    "T" => Object::string_literal(child),
                    "Parent" => parent_id,
                    "Subtype" => "Widget",
                    "Rect" => vec![100.into(), 500.into(), 300.into(), 520.into()],
                    "P" => page_id,
                });
                parents[index].2.push(Object::Reference(id));
            }
            None => {
                let id = doc.add_object(dictionary! {
                    "FT" => "Tx",
                    "T" => Object::string_literal(*name),
                    "Subtype" => "Widget",
                    "Rect" => vec![100.into(), 600.into(), 300.into(), 620.into()],
                    "P" => page_id,
                });
                top_level.push(Object::Reference(id));
            }
        }
    }

    for (name, id, kids) in parents {
        doc.objects.insert(
            id,
            Object::Dictionary(dictionary! {
                "FT" => "Tx",
                "T" => Object::string_literal(name),
                "Kids" => kids,
            }),
        );
        top_level.push(Object::Reference(id));
    }

    let acroform_id = doc.add_object(dictionary! {
        "Fields" => top_level,
    });
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
        "AcroForm" => acroform_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

fn page_content(bytes: &[u8], page_index: u32) -> String {
    let doc = Document::load_mem(bytes).expect("Failed to re-open PDF");
    let page_id = doc.get_pages()[&(page_index + 1)];
    String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap_or_default()).into_owned()
}

/// Qualified field name -> raw /V bytes
fn field_values(bytes: &[u8]) -> HashMap<String, Vec<u8>> {
    let doc = PdfDocument::open_from_bytes(bytes).expect("Failed to re-open PDF");
    let mut values = HashMap::new();
    for field in doc.form_fields().unwrap() {
        let dict = doc.inner().get_object(field.id).unwrap().as_dict().unwrap();
        if let Ok(Object::String(value, _)) = dict.get(b"V") {
            values.insert(field.name.clone(), value.clone());
        }
    }
    values
}

fn memory_filler() -> AutoFiller<MemoryStore> {
    AutoFiller::new(
        MappingStore::new(MemoryStore::new()),
        Registry::builtin().unwrap(),
    )
}

fn hana() -> ApplicationData {
    ApplicationData {
        child_name: Some("Hana Hanada".into()),
        ..Default::default()
    }
}

#[test]
fn test_fill_child_name_on_temporary_care_application() {
    let filler = memory_filler();
    let template = create_test_pdf(2);

    let filled = filler
        .fill(&template, "temporary_care_application", &hana())
        .unwrap();

    assert_eq!(filled.source, MappingSource::Registry);
    assert_eq!(filled.filled, vec!["childName"]);
    assert!(filled.errors.is_empty());

    let first = page_content(&filled.bytes, 0);
    assert!(first.contains("200 720 Td"), "content: {first}");
    assert!(first.contains("(Hana Hanada) Tj"));
    assert!(first.contains("/HkHelv 12 Tf"));
    assert!(first.contains("0 0 0 rg"));
    assert_eq!(first.matches(" Tj").count(), 1);

    let second = page_content(&filled.bytes, 1);
    assert!(!second.contains("Tj"));
}

#[test]
fn test_fill_with_embedded_font() {
    let font = FontData::from_ttf("HoikuTest", TEST_TTF).unwrap();
    let filler = memory_filler().with_font(font);
    let data = ApplicationData {
        child_name: Some("あ".into()),
        child_name_kana: Some("ABC".into()),
        ..Default::default()
    };

    let filled = filler
        .fill(&create_test_pdf(1), "temporary_care_application", &data)
        .unwrap();
    assert!(filled.is_complete());

    let content = page_content(&filled.bytes, 0);
    assert!(content.contains("/HkEmb 12 Tf"), "content: {content}");
    assert!(content.contains("<0004> Tj"));
    assert!(content.contains("/HkEmb 9 Tf"));
    assert!(content.contains("<000100020003> Tj"));
    assert!(!content.contains("HkHelv"));

    let doc = Document::load_mem(&filled.bytes).unwrap();
    let page = doc.get_object(doc.get_pages()[&1]).unwrap().as_dict().unwrap();
    let fonts = page
        .get(b"Resources")
        .and_then(Object::as_dict)
        .and_then(|r| r.get(b"Font"))
        .and_then(Object::as_dict)
        .unwrap();
    let type0 = doc
        .get_object(fonts.get(b"HkEmb").unwrap().as_reference().unwrap())
        .and_then(Object::as_dict)
        .unwrap();

    let tounicode = doc
        .get_object(type0.get(b"ToUnicode").unwrap().as_reference().unwrap())
        .and_then(Object::as_stream)
        .unwrap();
    let cmap = String::from_utf8_lossy(&tounicode.content);
    assert!(cmap.contains("<0004> <3042>"));
    assert!(cmap.contains("<0001> <0041>"));

    let cid_ref = type0.get(b"DescendantFonts").unwrap().as_array().unwrap()[0]
        .as_reference()
        .unwrap();
    let cid_font = doc.get_object(cid_ref).and_then(Object::as_dict).unwrap();
    let descriptor = doc
        .get_object(cid_font.get(b"FontDescriptor").unwrap().as_reference().unwrap())
        .and_then(Object::as_dict)
        .unwrap();
    assert!(descriptor.get(b"FontFile2").unwrap().as_reference().is_ok());
}

#[test]
fn test_template_bytes_are_untouched() {
    let filler = memory_filler();
    let template = create_test_pdf(1);
    let original = template.clone();

    let first = filler.fill(&template, "temporary_care_application", &hana()).unwrap();
    let second = filler.fill(&template, "temporary_care_application", &hana()).unwrap();

    assert_eq!(template, original);
    assert_eq!(page_content(&first.bytes, 0), page_content(&second.bytes, 0));
}

#[test]
fn test_missing_values_are_skipped() {
    let filler = memory_filler();
    let template = create_test_pdf(1);

    let without_phone = filler.fill(&template, "temporary_care_application", &hana()).unwrap();
    let with_phone = filler
        .fill(
            &template,
            "temporary_care_application",
            &ApplicationData {
                phone: Some("090-1234-5678".into()),
                ..hana()
            },
        )
        .unwrap();

    assert!(without_phone.skipped.contains(&"phone".to_string()));
    assert!(with_phone.filled.contains(&"phone".to_string()));

    let without = page_content(&without_phone.bytes, 0);
    let with = page_content(&with_phone.bytes, 0);
    assert!(!without.contains("200 615 Td"));
    assert!(with.contains("200 615 Td"));
    assert!(with.contains("(090-1234-5678) Tj"));
    assert_eq!(with.matches(" Tj").count(), without.matches(" Tj").count() + 1);
}

#[test]
fn test_empty_string_is_not_drawn() {
    let filler = memory_filler();
    let data = ApplicationData {
        notes: Some(String::new()),
        ..hana()
    };

    let filled = filler
        .fill(&create_test_pdf(1), "temporary_care_application", &data)
        .unwrap();

    assert!(filled.skipped.contains(&"notes".to_string()));
    assert!(!page_content(&filled.bytes, 0).contains("72 420 Td"));
}

#[test]
fn test_saved_mapping_takes_precedence() {
    let filler = memory_filler();
    let child = DataField::new("childName", "Child name", "");
    filler
        .store()
        .save(
            "temporary_care_application",
            &[FieldMapping::new(&child, Coordinate::new(50.0, 60.0, 0).with_size(14.0))],
        )
        .unwrap();

    let filled = filler
        .fill(&create_test_pdf(1), "temporary_care_application", &hana())
        .unwrap();

    assert_eq!(filled.source, MappingSource::Saved);
    let content = page_content(&filled.bytes, 0);
    assert!(content.contains("50 60 Td"));
    assert!(content.contains("/HkHelv 14 Tf"));
    assert!(!content.contains("200 720 Td"));
}

#[test]
fn test_saved_mapping_for_unregistered_template() {
    let filler = memory_filler();
    let facility = DataField::new("facilityName", "Facility", "");
    filler
        .store()
        .save(
            "city_form",
            &[FieldMapping::new(&facility, Coordinate::new(100.0, 100.0, 1))],
        )
        .unwrap();

    let data = ApplicationData {
        facility_name: Some("Sakura Nursery".into()),
        ..Default::default()
    };
    let filled = filler.fill(&create_test_pdf(2), "city_form", &data).unwrap();

    assert!(!page_content(&filled.bytes, 0).contains("Tj"));
    assert!(page_content(&filled.bytes, 1).contains("(Sakura Nursery) Tj"));
}

#[test]
fn test_out_of_range_page_is_collected() {
    let filler = memory_filler();
    let child = DataField::new("childName", "Child name", "");
    let facility = DataField::new("facilityName", "Facility", "");
    filler
        .store()
        .save(
            "t1",
            &[
                FieldMapping::new(&child, Coordinate::new(10.0, 10.0, 5)),
                FieldMapping::new(&facility, Coordinate::new(20.0, 20.0, 0)),
            ],
        )
        .unwrap();

    let data = ApplicationData {
        facility_name: Some("Sakura Nursery".into()),
        ..hana()
    };
    let filled = filler.fill(&create_test_pdf(1), "t1", &data).unwrap();

    assert!(!filled.is_complete());
    assert_eq!(filled.errors.len(), 1);
    assert_eq!(filled.errors[0].field_id, "childName");
    assert_eq!(filled.filled, vec!["facilityName"]);
    assert!(page_content(&filled.bytes, 0).contains("(Sakura Nursery) Tj"));
}

#[test]
fn test_acroform_fill_continues_past_missing_field() {
    let filler = memory_filler();
    let template = create_form_pdf(&[
        "facility_name",
        "guardian.name",
        "guardian.phone",
        "child.name",
        "remarks",
    ]);

    let data = ApplicationData {
        facility_name: Some("Sakura Nursery".into()),
        applicant_name: Some("Taro Hanada".into()),
        phone: Some("090-1234-5678".into()),
        email: Some("taro@example.com".into()),
        notes: Some("Allergic to eggs".into()),
        ..hana()
    };

    let filled = filler
        .fill(&template, "nursery_enrollment_application", &data)
        .unwrap();

    assert_eq!(filled.source, MappingSource::Registry);
    assert_eq!(filled.errors.len(), 1);
    assert_eq!(filled.errors[0].field_id, "email");

    let values = field_values(&filled.bytes);
    assert_eq!(values["facility_name"], b"Sakura Nursery");
    assert_eq!(values["guardian.name"], b"Taro Hanada");
    assert_eq!(values["guardian.phone"], b"090-1234-5678");
    assert_eq!(values["child.name"], b"Hana Hanada");
    assert_eq!(values["remarks"], b"Allergic to eggs");
}

#[test]
fn test_acroform_unicode_value() {
    let filler = memory_filler();
    let template = create_form_pdf(&["child.name"]);
    let data = ApplicationData {
        child_name: Some("花田はな".into()),
        ..Default::default()
    };

    let filled = filler
        .fill(&template, "nursery_enrollment_application", &data)
        .unwrap();

    let values = field_values(&filled.bytes);
    assert!(values["child.name"].starts_with(&[0xFE, 0xFF]));
}

#[test]
fn test_no_mapping_configured() {
    let filler = memory_filler();
    let result = filler.fill(&create_test_pdf(1), "unregistered", &hana());

    let err = result.unwrap_err();
    assert!(matches!(err, TemplateError::MappingNotFound(_)));
    assert!(err.to_string().contains("configure it first"));
}

#[test]
fn test_corrupt_template_bytes() {
    let filler = memory_filler();
    let result = filler.fill(b"not a pdf at all", "temporary_care_application", &hana());
    assert!(matches!(result, Err(TemplateError::TemplateLoad(_))));
}

#[test]
fn test_fill_from_sources() {
    let filler = memory_filler();

    let bundle = BytesTemplateSource::new()
        .with_template("temporary_care_application", create_test_pdf(1));
    let filled = filler
        .fill_from_source(&bundle, "temporary_care_application", &hana())
        .unwrap();
    assert!(page_content(&filled.bytes, 0).contains("(Hana Hanada) Tj"));

    let dir = tempfile::tempdir().unwrap();
    let files = FileTemplateSource::new(dir.path());
    let result = filler.fill_from_source(&files, "temporary_care_application", &hana());
    assert!(matches!(result, Err(TemplateError::TemplateLoad(_))));

    std::fs::write(
        dir.path().join("temporary_care_application.pdf"),
        create_test_pdf(1),
    )
    .unwrap();
    let filled = filler
        .fill_from_source(&files, "temporary_care_application", &hana())
        .unwrap();
    assert_eq!(filled.filled, vec!["childName"]);
}

#[test]
fn test_custom_text_color() {
    let filler = memory_filler().with_config(FillConfig {
        text_color: [255, 0, 0],
        ..Default::default()
    });

    let filled = filler
        .fill(&create_test_pdf(1), "temporary_care_application", &hana())
        .unwrap();

    assert!(page_content(&filled.bytes, 0).contains("1 0 0 rg"));
}

#[test]
fn test_file_store_mapping_drives_fill() {
    let dir = tempfile::tempdir().unwrap();
    let store = MappingStore::new(FileStore::new(dir.path()).unwrap());
    let child = DataField::new("childName", "Child name", "");
    store
        .save(
            "temporary_care_application",
            &[FieldMapping::new(&child, Coordinate::new(300.0, 300.0, 0))],
        )
        .unwrap();

    let filler = AutoFiller::new(store, Registry::builtin().unwrap());
    let filled = filler
        .fill(&create_test_pdf(1), "temporary_care_application", &hana())
        .unwrap();

    assert_eq!(filled.source, MappingSource::Saved);
    assert!(page_content(&filled.bytes, 0).contains("300 300 Td"));
}
