//! Product image collection
//!
//! Images are gathered tier by tier: the carousel, the legacy gallery, modal
//! thumbnails and finally URLs embedded in inline scripts. Every candidate is
//! resolved, classified and upgraded to the large rendition before it is kept.

use crate::config::SiteConfig;
use crate::url::absolutize;
use regex::{Captures, Regex};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

const SLIDE_SELECTOR: &str = ".swiper-slide img";
const GALLERY_SELECTOR: &str = ".gallery img, .product-images img, [class*=\"gallery\"] img";
const MODAL_SELECTOR: &str = "[class*=\"modal\"] img, [class*=\"thumbnail\"] img";
const SCRIPT_SELECTOR: &str = "script";

/// Extensions of product image files
const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".webp"];

/// Script scanning also runs while fewer images than this were found
const MIN_IMAGES_BEFORE_SCRIPT_SCAN: usize = 3;

/// Rendition requested for thumbnail URLs
const LARGE_RENDITION: &str = "/unsafe/636x0/";

/// Renditions at least this large, on either side, are kept as they are
const LARGE_RENDITION_SIZE: u32 = 636;

/// Decides which URLs are product photos
#[derive(Debug, Clone)]
pub struct ImageClassifier {
    cdn_hosts: Vec<String>,
    reject_fragments: Vec<String>,
    thumbnail: Regex,
}

impl ImageClassifier {
    pub fn new(cdn_hosts: &[String], reject_fragments: &[String]) -> Result<Self, regex::Error> {
        Ok(Self {
            cdn_hosts: cdn_hosts.iter().map(|h| h.to_lowercase()).collect(),
            reject_fragments: reject_fragments.iter().map(|f| f.to_lowercase()).collect(),
            thumbnail: Regex::new(r"/unsafe/(\d+)x(\d+)/")?,
        })
    }

    pub fn from_site(site: &SiteConfig) -> Result<Self, regex::Error> {
        Self::new(&site.image_cdn_hosts, &site.image_reject_fragments)
    }

    /// Returns true if `url` is a product photo on a known CDN
    ///
    /// The reject list is consulted first so a logo on the CDN still fails.
    pub fn is_product_image(&self, url: &str) -> bool {
        let lowered = url.to_lowercase();
        if self.reject_fragments.iter().any(|f| lowered.contains(f)) {
            return false;
        }

        let Ok(parsed) = Url::parse(&lowered) else {
            return false;
        };
        let host_known = parsed
            .host_str()
            .map(|host| self.cdn_hosts.iter().any(|h| h == host))
            .unwrap_or(false);

        host_known && IMAGE_EXTENSIONS.iter().any(|ext| parsed.path().ends_with(ext))
    }

    /// Rewrites a sized thumbnail URL to the large rendition
    ///
    /// A `0` dimension means "scale to the other one", so `750x0` is already
    /// larger than the target and stays untouched.
    pub fn upgrade(&self, url: &str) -> String {
        self.thumbnail
            .replace(url, |caps: &Captures| {
                let side = |i: usize| caps[i].parse::<u32>().unwrap_or(0);
                if side(1).max(side(2)) >= LARGE_RENDITION_SIZE {
                    caps[0].to_string()
                } else {
                    LARGE_RENDITION.to_string()
                }
            })
            .into_owned()
    }
}

/// Ordered, de-duplicated image collector
struct Collected<'a> {
    classifier: &'a ImageClassifier,
    page_url: &'a Url,
    seen: HashSet<String>,
    urls: Vec<String>,
}

impl<'a> Collected<'a> {
    fn offer(&mut self, raw: &str) -> bool {
        let Some(absolute) = absolutize(raw, self.page_url) else {
            return false;
        };
        if !self.classifier.is_product_image(&absolute) {
            return false;
        }
        let upgraded = self.classifier.upgrade(&absolute);
        if self.seen.insert(upgraded.clone()) {
            self.urls.push(upgraded);
            true
        } else {
            false
        }
    }
}

/// Collects product images of a detail page
pub fn collect_images(document: &Html, page_url: &Url, classifier: &ImageClassifier) -> Vec<String> {
    let mut collected = Collected {
        classifier,
        page_url,
        seen: HashSet::new(),
        urls: Vec::new(),
    };

    for (tier, selector) in [
        ("carousel", SLIDE_SELECTOR),
        ("gallery", GALLERY_SELECTOR),
        ("modal", MODAL_SELECTOR),
    ] {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };
        let mut added = 0;
        for img in document.select(&selector) {
            if let Some(src) = preferred_source(&img) {
                if collected.offer(&src) {
                    added += 1;
                }
            }
        }
        if added > 0 {
            tracing::trace!("Image tier '{}' yielded {} image(s)", tier, added);
            break;
        }
    }

    if collected.urls.len() < MIN_IMAGES_BEFORE_SCRIPT_SCAN {
        scan_scripts(document, &mut collected);
    }

    collected.urls
}

/// The 2x srcset candidate if present, otherwise `src` or `data-src`
fn preferred_source(img: &ElementRef<'_>) -> Option<String> {
    let element = img.value();

    if let Some(srcset) = element.attr("srcset").or_else(|| element.attr("data-srcset")) {
        let dense = srcset.split(',').find_map(|candidate| {
            let mut parts = candidate.split_whitespace();
            let url = parts.next()?;
            (parts.next() == Some("2x")).then(|| url.to_string())
        });
        if dense.is_some() {
            return dense;
        }
    }

    element
        .attr("src")
        .filter(|s| !s.trim().is_empty() && !s.starts_with("data:"))
        .or_else(|| element.attr("data-src"))
        .map(str::to_string)
}

/// Scans inline scripts for CDN image URLs
fn scan_scripts(document: &Html, collected: &mut Collected<'_>) {
    let (Ok(selector), Ok(pattern)) = (
        Selector::parse(SCRIPT_SELECTOR),
        Regex::new(r#"https?://[^\s"'<>\\]+?\.(?:jpe?g|png|webp)"#),
    ) else {
        return;
    };

    for script in document.select(&selector) {
        let body: String = script.text().collect();
        let body = body.replace("\\/", "/");
        for m in pattern.find_iter(&body) {
            collected.offer(m.as_str());
        }
    }
}
