/*!
 * XForm document transformation.
 *
 * Produces a per-site edition of the shared XForm: translations the site did
 * not ask for are pruned (the site's first language becomes the default), and
 * the form's SID element gets the site code appended so records are globally
 * distinguishable per site.
 *
 * The document is rewritten as a stream of quick-xml events rather than a
 * DOM: a scan pass gathers what the rewrite pass needs to know up front
 * (how many SID elements exist), then a second pass emits the transformed
 * bytes. Elements are matched by local name, so the transform works whether
 * the xforms namespace is the default or prefixed.
 */

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};

use crate::errors::EditionsError;
use crate::reporting::Reporter;

/// Structural path of the SID element: a `sid` whose parent is `visit`,
/// somewhere below an `instance` element.
const SID_PARENT: &[u8] = b"visit";
const SID_ANCESTOR: &[u8] = b"instance";
const SID_LOCAL: &[u8] = b"sid";
const TRANSLATION_LOCAL: &[u8] = b"translation";
const DEFAULT_ATTR: &[u8] = b"default";
const LANG_ATTR: &[u8] = b"lang";
const DEFAULT_FLAG_VALUE: &str = "true()";

/// Remove translations that are not listed, and mark the first as default.
///
/// Retained translation elements keep all their attributes except `default`,
/// which is set to `true()` on the element whose `lang` equals the first
/// entry of `languages` and removed everywhere else. Only the first entry
/// can become the default, regardless of duplicates later in the list.
/// A translation element without a `lang` attribute fails the transform.
pub fn filter_languages(xml: &[u8], languages: &[String]) -> Result<Vec<u8>, EditionsError> {
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));
    let mut buf = Vec::new();
    let mut skip_buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(e) if e.local_name().as_ref() == TRANSLATION_LOCAL => {
                let lang = require_lang(&e)?;
                if languages.contains(&lang) {
                    let is_default = languages.first() == Some(&lang);
                    writer.write_event(Event::Start(rewrite_translation(&e, is_default)?))?;
                } else {
                    // Language not selected for this site: drop the whole subtree.
                    let name = e.name().as_ref().to_vec();
                    reader.read_to_end_into(QName(&name), &mut skip_buf)?;
                }
            }
            Event::Empty(e) if e.local_name().as_ref() == TRANSLATION_LOCAL => {
                let lang = require_lang(&e)?;
                if languages.contains(&lang) {
                    let is_default = languages.first() == Some(&lang);
                    writer.write_event(Event::Empty(rewrite_translation(&e, is_default)?))?;
                }
            }
            event => writer.write_event(event)?,
        }
        buf.clear();
    }
    Ok(writer.into_inner())
}

/// Find the SID form element and append the site code to the default value.
///
/// The append only happens when exactly one SID element exists; zero or more
/// than one match leaves the document untouched, which is reported but not
/// fatal. Stamping is cumulative: callers stamp a parsed document at most
/// once.
pub fn stamp_sid(
    xml: &[u8],
    site_code: &str,
    reporter: &dyn Reporter,
) -> Result<Vec<u8>, EditionsError> {
    let sids_found = count_sid_elements(xml)?;
    let appended = sids_found == 1;
    reporter.info(&format!(
        "Add to sid. Site code: {0}, SIDs found: {1}, Appended: {2}",
        site_code, sids_found, appended
    ));
    if !appended {
        reporter.warn(&format!(
            "Site {0}: expected 1 SID element, found {1}; output left unstamped.",
            site_code, sids_found
        ));
        return Ok(xml.to_vec());
    }
    append_to_sid(xml, site_code)
}

/// Apply the full per-site transform: language filter, then SID stamp.
pub fn transform(
    xml: &[u8],
    languages: &[String],
    site_code: &str,
    reporter: &dyn Reporter,
) -> Result<Vec<u8>, EditionsError> {
    let filtered = filter_languages(xml, languages)?;
    stamp_sid(&filtered, site_code, reporter)
}

/// The `lang` attribute of a translation element; a translation without one
/// is a document format error.
fn require_lang(e: &BytesStart) -> Result<String, EditionsError> {
    translation_lang(e)?.ok_or_else(|| {
        EditionsError::Xml("translation element has no 'lang' attribute".to_string())
    })
}

/// The `lang` attribute of a translation element, if present.
fn translation_lang(e: &BytesStart) -> Result<Option<String>, EditionsError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| EditionsError::Xml(err.to_string()))?;
        if attr.key.as_ref() == LANG_ATTR {
            let value = attr
                .unescape_value()
                .map_err(|err| EditionsError::Xml(err.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Copy a translation element, dropping any `default` attribute and adding
/// `default="true()"` when this is the site's first language.
fn rewrite_translation(
    e: &BytesStart,
    is_default: bool,
) -> Result<BytesStart<'static>, EditionsError> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut elem = BytesStart::new(name);
    for attr in e.attributes() {
        let attr = attr.map_err(|err| EditionsError::Xml(err.to_string()))?;
        if attr.key.as_ref() == DEFAULT_ATTR {
            continue;
        }
        elem.push_attribute(attr);
    }
    if is_default {
        elem.push_attribute(("default", DEFAULT_FLAG_VALUE));
    }
    Ok(elem.into_owned())
}

/// Scan pass: count elements matching the `instance//visit/sid` path.
fn count_sid_elements(xml: &[u8]) -> Result<usize, EditionsError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut count = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(e) => {
                let local = e.local_name().as_ref().to_vec();
                if is_sid_position(&local, &stack) {
                    count += 1;
                }
                stack.push(local);
            }
            Event::Empty(e) => {
                if is_sid_position(e.local_name().as_ref(), &stack) {
                    count += 1;
                }
            }
            Event::End(_) => {
                stack.pop();
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(count)
}

/// True when an element with this local name, opened with `stack` as its
/// ancestor chain, sits at `instance//visit/sid`.
fn is_sid_position(local: &[u8], stack: &[Vec<u8>]) -> bool {
    local == SID_LOCAL
        && stack.last().map(|p| p.as_slice()) == Some(SID_PARENT)
        && stack.iter().any(|a| a == SID_ANCESTOR)
}

/// Rewrite pass: append `"{site_code}-"` to the text of the single SID
/// element. Callers have already established that exactly one match exists.
fn append_to_sid(xml: &[u8], site_code: &str) -> Result<Vec<u8>, EditionsError> {
    let suffix = format!("{}-", site_code);
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len() + suffix.len()));
    let mut buf = Vec::new();
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut in_sid_depth: Option<usize> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(e) => {
                let local = e.local_name().as_ref().to_vec();
                if in_sid_depth.is_none() && is_sid_position(&local, &stack) {
                    in_sid_depth = Some(stack.len());
                }
                stack.push(local);
                writer.write_event(Event::Start(e))?;
            }
            Event::Empty(e) => {
                if in_sid_depth.is_none() && is_sid_position(e.local_name().as_ref(), &stack) {
                    // Self-closing SID holds no text yet; expand it so the
                    // suffix has somewhere to live.
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    let mut start = BytesStart::new(name.clone());
                    for attr in e.attributes() {
                        let attr = attr.map_err(|err| EditionsError::Xml(err.to_string()))?;
                        start.push_attribute(attr);
                    }
                    writer.write_event(Event::Start(start))?;
                    writer.write_event(Event::Text(BytesText::new(&suffix)))?;
                    writer.write_event(Event::End(BytesEnd::new(name)))?;
                } else {
                    writer.write_event(Event::Empty(e))?;
                }
            }
            Event::End(e) => {
                if in_sid_depth == Some(stack.len().saturating_sub(1)) {
                    writer.write_event(Event::Text(BytesText::new(&suffix)))?;
                    in_sid_depth = None;
                }
                stack.pop();
                writer.write_event(Event::End(e))?;
            }
            event => writer.write_event(event)?,
        }
        buf.clear();
    }
    Ok(writer.into_inner())
}
