// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Geometry, enhancement and annotation on synthetic pages

use image::{imageops, Rgb, RgbImage};
use roi_ocr_node::vision::annotate::{draw_boxes, BOX_COLOR};
use roi_ocr_node::vision::detection::ContourDetector;
use roi_ocr_node::vision::ocr::tesseract::parse_tsv;
use roi_ocr_node::vision::{
    clamp_box, decode_image_bytes, rank_by_area_descending, BoundingBox, DetectParams, Detection,
    Detector, RoiPreprocessor,
};

fn page_with_text_block() -> RgbImage {
    RgbImage::from_fn(300, 200, |x, y| {
        // Stripes stand in for lines of text
        if (60..240).contains(&x) && (50..150).contains(&y) && (y / 6) % 2 == 0 {
            Rgb([20, 20, 20])
        } else {
            Rgb([245, 245, 245])
        }
    })
}

#[test]
fn test_ranked_crop_is_largest_region() {
    let detections = vec![
        Detection::new(BoundingBox::new(0.0, 0.0, 10.0, 10.0), 0.9, "cup"),
        Detection::new(BoundingBox::new(60.0, 50.0, 180.0, 100.0), 0.4, "paper"),
        Detection::new(BoundingBox::new(5.0, 5.0, 30.0, 30.0), 0.7, "book"),
    ];
    let ranked = rank_by_area_descending(detections);
    assert_eq!(ranked[0].label, "paper");
    assert_eq!(ranked[2].label, "cup");

    let page = page_with_text_block();
    let bbox = clamp_box(&ranked[0].bbox, page.width(), page.height()).unwrap();
    let (x, y, w, h) = bbox.pixel_rect(page.width(), page.height());
    let roi = imageops::crop_imm(&page, x, y, w, h).to_image();
    assert_eq!(roi.dimensions(), (180, 100));
}

#[test]
fn test_enhanced_roi_is_binary() {
    let page = page_with_text_block();
    let roi = imageops::crop_imm(&page, 60, 50, 180, 100).to_image();

    let prepared = RoiPreprocessor::default().prepare_for_recognition(&roi);
    assert_eq!(prepared.dimensions(), roi.dimensions());
    assert!(prepared
        .pixels()
        .all(|p| p.0 == [0, 0, 0] || p.0 == [255, 255, 255]));
}

#[test]
fn test_passthrough_is_identity() {
    let page = page_with_text_block();
    let prepared = RoiPreprocessor::passthrough().prepare_for_recognition(&page);
    assert_eq!(prepared, page);
}

#[test]
fn test_contour_detector_on_card() {
    let page = RgbImage::from_fn(300, 200, |x, y| {
        if (60..240).contains(&x) && (50..150).contains(&y) {
            Rgb([40, 40, 40])
        } else {
            Rgb([245, 245, 245])
        }
    });
    let found = ContourDetector::new()
        .detect(&page, &DetectParams::default())
        .unwrap();

    assert_eq!(found.len(), 1);
    let bbox = found[0].bbox;
    assert!(bbox.x <= 62.0 && bbox.y <= 52.0);
    assert!(bbox.right() >= 236.0);
}

#[test]
fn test_annotation_marks_box_edges() {
    let page = page_with_text_block();
    let boxes = [BoundingBox::new(10.0, 10.0, 50.0, 40.0)];
    let drawn = draw_boxes(&page, boxes.iter());

    assert_eq!(*drawn.get_pixel(10, 10), BOX_COLOR);
    assert_eq!(*drawn.get_pixel(30, 10), BOX_COLOR);
    assert_eq!(*drawn.get_pixel(30, 30), *page.get_pixel(30, 30));
}

#[test]
fn test_decode_rejects_garbage() {
    assert!(decode_image_bytes(b"GIF89a but not really", 1024).is_err());
    assert!(decode_image_bytes(&[], 1024).is_err());
}

#[test]
fn test_tesseract_tsv_lines() {
    let tsv = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext\n\
               5\t1\t1\t1\t1\t1\t10\t10\t40\t12\t90\tTotal\n\
               5\t1\t1\t1\t1\t2\t60\t10\t40\t12\t80\t$12.50\n\
               5\t1\t1\t1\t2\t1\t10\t30\t40\t12\t70\tThanks\n";
    let text = parse_tsv(tsv);
    assert_eq!(text.text, "Total $12.50\nThanks");
    assert!((text.confidence - 0.8).abs() < 1e-6);
}
