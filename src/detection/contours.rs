use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use crate::models::Contour;

/// Find the outermost borders in a binary image (nonzero = foreground).
/// Borders nested inside other regions are skipped.
pub fn find_external_contours(binary: &GrayImage) -> Vec<Contour> {
    find_contours::<i32>(binary)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| Contour::new(c.points))
        .collect()
}

/// External contours whose enclosed area is at least `min_area`.
pub fn find_contours_min_area(binary: &GrayImage, min_area: f64) -> Vec<Contour> {
    find_external_contours(binary)
        .into_iter()
        .filter(|c| c.area() >= min_area)
        .collect()
}

/// Contour with the largest enclosed area. The first one wins a tie.
pub fn largest(contours: &[Contour]) -> Option<&Contour> {
    let mut best: Option<(&Contour, f64)> = None;
    for contour in contours {
        let area = contour.area();
        match best {
            Some((_, best_area)) if area <= best_area => {}
            _ => best = Some((contour, area)),
        }
    }
    best.map(|(c, _)| c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn filled_rect(img: &mut GrayImage, x0: u32, y0: u32, x1: u32, y1: u32) {
        for y in y0..=y1 {
            for x in x0..=x1 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
    }

    #[test]
    fn nested_regions_are_not_external() {
        let mut img = GrayImage::new(60, 60);
        filled_rect(&mut img, 5, 5, 54, 54);
        // punch a hole and put an island inside it
        for y in 15..=44 {
            for x in 15..=44 {
                img.put_pixel(x, y, Luma([0]));
            }
        }
        filled_rect(&mut img, 25, 25, 34, 34);

        let contours = find_external_contours(&img);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].bounding_box().width, 50);
    }

    #[test]
    fn largest_picks_biggest_area() {
        let mut img = GrayImage::new(80, 40);
        filled_rect(&mut img, 2, 2, 11, 11);
        filled_rect(&mut img, 30, 5, 69, 34);

        let contours = find_external_contours(&img);
        assert_eq!(contours.len(), 2);
        let big = largest(&contours).unwrap();
        assert_eq!(big.bounding_box().x, 30);
        assert_eq!(big.area(), 39.0 * 29.0);
    }

    #[test]
    fn min_area_filters_small_regions() {
        let mut img = GrayImage::new(80, 40);
        filled_rect(&mut img, 2, 2, 5, 5);
        filled_rect(&mut img, 30, 5, 69, 34);
        assert_eq!(find_contours_min_area(&img, 100.0).len(), 1);
    }

    #[test]
    fn empty_image_has_no_contours() {
        let img = GrayImage::new(20, 20);
        assert!(find_external_contours(&img).is_empty());
        assert!(largest(&[]).is_none());
    }
}
