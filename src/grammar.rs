//! The rules-file grammar.
//!
//! Translates one parsed XML document into registry entities. The grammar
//! is fixed: the root element's `modelList`, `layoutList` and `optionList`
//! children are walked, everything else is ignored, so documents carrying
//! newer schema extensions still load. Each model/layout/variant/group/
//! option container is described by a single `configItem` child; a
//! container without one contributes nothing and its siblings are
//! unaffected.
//!
//! The walk builds scratch [`Sections`] which the context splices in only
//! after the whole document was processed, so a failed parse never leaves
//! a partially populated tree behind.

use roxmltree::{Document, Node};

use crate::registry::{Layout, Model, OptionEntry, OptionGroup, Variant};
use crate::Result;

/// Scratch output of one document walk, not yet attached to a context.
pub(crate) struct Sections {
    pub(crate) models: Vec<Model>,
    pub(crate) layouts: Vec<Layout>,
    pub(crate) groups: Vec<OptionGroup>,
}

/// Walk `text` as a rules document and build the registry sections.
pub(crate) fn parse_document(text: &str) -> Result<Sections> {
    let doc = Document::parse(text)?;
    let mut sections = Sections {
        models: Vec::new(),
        layouts: Vec::new(),
        groups: Vec::new(),
    };

    // Repeated sections are each processed in full.
    for node in doc.root_element().children() {
        if is_element(node, "modelList") {
            parse_model_list(node, &mut sections.models);
        } else if is_element(node, "layoutList") {
            parse_layout_list(node, &mut sections.layouts);
        } else if is_element(node, "optionList") {
            parse_option_list(node, &mut sections.groups);
        }
    }

    Ok(sections)
}

fn is_element(node: Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

/// Content of the first text child, as the element's value.
fn text_of(node: Node) -> Option<String> {
    node.children()
        .find(|n| n.is_text())
        .and_then(|n| n.text())
        .map(str::to_string)
}

/// The dual-purpose third config-item slot. The grammar serializes it as
/// `vendor` for models and `shortDescription` for layouts, variants and
/// options; whichever element is present fills the slot, and the caller
/// projects it out under the name its entity uses.
enum Aux {
    Absent,
    Vendor(String),
    Brief(String),
}

impl Aux {
    /// Whichever element filled the slot supplies the value; the named
    /// projections below only give it the field name the caller's entity
    /// uses.
    fn into_value(self) -> Option<String> {
        match self {
            Aux::Absent => None,
            Aux::Vendor(s) | Aux::Brief(s) => Some(s),
        }
    }

    fn into_vendor(self) -> Option<String> {
        self.into_value()
    }

    fn into_brief(self) -> Option<String> {
        self.into_value()
    }
}

struct ConfigItem {
    name: Option<String>,
    description: Option<String>,
    aux: Aux,
}

/// Extract the first `configItem` child of `parent`, or `None` if there is
/// none (the container is then discarded entirely). Within the item, a
/// later occurrence of a field element overwrites an earlier one.
fn parse_config_item(parent: Node) -> Option<ConfigItem> {
    let ci = parent.children().find(|n| is_element(*n, "configItem"))?;

    let mut item = ConfigItem {
        name: None,
        description: None,
        aux: Aux::Absent,
    };
    for node in ci.children() {
        if is_element(node, "name") {
            item.name = text_of(node);
        } else if is_element(node, "description") {
            item.description = text_of(node);
        } else if is_element(node, "shortDescription") {
            item.aux = text_of(node).map_or(Aux::Absent, Aux::Brief);
        } else if is_element(node, "vendor") {
            item.aux = text_of(node).map_or(Aux::Absent, Aux::Vendor);
        }
    }
    Some(item)
}

fn parse_model_list(list: Node, models: &mut Vec<Model>) {
    for node in list.children().filter(|n| is_element(*n, "model")) {
        if let Some(item) = parse_config_item(node) {
            models.push(Model::new(item.name, item.aux.into_vendor(), item.description));
        }
    }
}

fn parse_layout_list(list: Node, layouts: &mut Vec<Layout>) {
    for node in list.children().filter(|n| is_element(*n, "layout")) {
        parse_layout(node, layouts);
    }
}

fn parse_layout(node: Node, layouts: &mut Vec<Layout>) {
    let Some(item) = parse_config_item(node) else {
        return;
    };
    let layout = Layout::new(item.name, item.aux.into_brief(), item.description);

    // Only the first variantList of a layout is scanned.
    if let Some(list) = node.children().find(|n| is_element(*n, "variantList")) {
        for vnode in list.children().filter(|n| is_element(*n, "variant")) {
            if let Some(vitem) = parse_config_item(vnode) {
                layout.push_variant(Variant::new(
                    vitem.name,
                    vitem.aux.into_brief(),
                    vitem.description,
                ));
            }
        }
    }

    layouts.push(layout);
}

fn parse_option_list(list: Node, groups: &mut Vec<OptionGroup>) {
    for node in list.children().filter(|n| is_element(*n, "group")) {
        parse_group(node, groups);
    }
}

fn parse_group(node: Node, groups: &mut Vec<OptionGroup>) {
    let Some(item) = parse_config_item(node) else {
        return;
    };

    // Only an explicit "true" marks the group as multi-select; anything
    // else, including an absent attribute, leaves it mutually exclusive.
    let allows_multiple = node.attribute("allowMultipleSelection") == Some("true");

    let group = OptionGroup::new(item.name, item.description, allows_multiple);
    for onode in node.children().filter(|n| is_element(*n, "option")) {
        if let Some(oitem) = parse_config_item(onode) {
            group.push_option(OptionEntry::new(
                oitem.name,
                oitem.aux.into_brief(),
                oitem.description,
            ));
        }
    }

    groups.push(group);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_fields_come_from_the_config_item() {
        let sections = parse_document(
            r#"<xkbConfigRegistry>
                 <modelList>
                   <model>
                     <configItem>
                       <name>pc104</name>
                       <vendor>Generic</vendor>
                       <description>Generic 104-key PC</description>
                     </configItem>
                   </model>
                 </modelList>
               </xkbConfigRegistry>"#,
        )
        .unwrap();

        assert_eq!(sections.models.len(), 1);
        let m = &sections.models[0];
        assert_eq!(m.name(), Some("pc104"));
        assert_eq!(m.vendor(), Some("Generic"));
        assert_eq!(m.description(), Some("Generic 104-key PC"));
    }

    #[test]
    fn container_without_config_item_is_skipped() {
        let sections = parse_document(
            r#"<xkbConfigRegistry>
                 <modelList>
                   <model><name>not-a-config-item</name></model>
                   <model><configItem><name>pc105</name></configItem></model>
                 </modelList>
               </xkbConfigRegistry>"#,
        )
        .unwrap();

        assert_eq!(sections.models.len(), 1);
        assert_eq!(sections.models[0].name(), Some("pc105"));
    }

    #[test]
    fn config_item_without_name_still_yields_an_entity() {
        let sections = parse_document(
            r#"<xkbConfigRegistry>
                 <modelList>
                   <model>
                     <configItem>
                       <vendor>Acme</vendor>
                       <description>Nameless</description>
                     </configItem>
                   </model>
                 </modelList>
               </xkbConfigRegistry>"#,
        )
        .unwrap();

        assert_eq!(sections.models.len(), 1);
        let m = &sections.models[0];
        assert_eq!(m.name(), None);
        assert_eq!(m.vendor(), Some("Acme"));
        assert_eq!(m.description(), Some("Nameless"));
    }

    #[test]
    fn short_description_under_a_model_reads_as_vendor() {
        let sections = parse_document(
            r#"<xkbConfigRegistry>
                 <modelList>
                   <model>
                     <configItem>
                       <name>pc104</name>
                       <shortDescription>PC</shortDescription>
                     </configItem>
                   </model>
                 </modelList>
               </xkbConfigRegistry>"#,
        )
        .unwrap();

        assert_eq!(sections.models[0].vendor(), Some("PC"));
    }

    #[test]
    fn vendor_under_a_layout_reads_as_brief() {
        let sections = parse_document(
            r#"<xkbConfigRegistry>
                 <layoutList>
                   <layout>
                     <configItem>
                       <name>us</name>
                       <vendor>Generic</vendor>
                     </configItem>
                   </layout>
                 </layoutList>
               </xkbConfigRegistry>"#,
        )
        .unwrap();

        assert_eq!(sections.layouts[0].brief(), Some("Generic"));
    }

    #[test]
    fn later_field_occurrence_overwrites_earlier() {
        let sections = parse_document(
            r#"<xkbConfigRegistry>
                 <modelList>
                   <model>
                     <configItem>
                       <name>first</name>
                       <name>second</name>
                     </configItem>
                   </model>
                 </modelList>
               </xkbConfigRegistry>"#,
        )
        .unwrap();

        assert_eq!(sections.models[0].name(), Some("second"));
    }

    #[test]
    fn unknown_elements_are_ignored_at_every_level() {
        let sections = parse_document(
            r#"<xkbConfigRegistry>
                 <somethingNew/>
                 <modelList>
                   <gadget/>
                   <model>
                     <configItem>
                       <name>pc104</name>
                       <future>ignored</future>
                     </configItem>
                   </model>
                 </modelList>
               </xkbConfigRegistry>"#,
        )
        .unwrap();

        assert_eq!(sections.models.len(), 1);
        assert_eq!(sections.models[0].name(), Some("pc104"));
    }

    #[test]
    fn repeated_sections_accumulate_in_document_order() {
        let sections = parse_document(
            r#"<xkbConfigRegistry>
                 <modelList>
                   <model><configItem><name>a</name></configItem></model>
                 </modelList>
                 <modelList>
                   <model><configItem><name>b</name></configItem></model>
                 </modelList>
               </xkbConfigRegistry>"#,
        )
        .unwrap();

        let names: Vec<_> = sections.models.iter().map(|m| m.name().unwrap().to_string()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn only_the_first_variant_list_is_scanned() {
        let sections = parse_document(
            r#"<xkbConfigRegistry>
                 <layoutList>
                   <layout>
                     <configItem><name>de</name></configItem>
                     <variantList>
                       <variant><configItem><name>neo</name></configItem></variant>
                     </variantList>
                     <variantList>
                       <variant><configItem><name>ignored</name></configItem></variant>
                     </variantList>
                   </layout>
                 </layoutList>
               </xkbConfigRegistry>"#,
        )
        .unwrap();

        let layout = &sections.layouts[0];
        let variants: Vec<_> = layout.variants().collect();
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].name(), Some("neo"));
    }

    #[test]
    fn allow_multiple_selection_requires_a_literal_true() {
        let sections = parse_document(
            r#"<xkbConfigRegistry>
                 <optionList>
                   <group allowMultipleSelection="true">
                     <configItem><name>multi</name></configItem>
                   </group>
                   <group allowMultipleSelection="yes">
                     <configItem><name>odd</name></configItem>
                   </group>
                   <group>
                     <configItem><name>plain</name></configItem>
                   </group>
                 </optionList>
               </xkbConfigRegistry>"#,
        )
        .unwrap();

        assert!(sections.groups[0].allows_multiple());
        assert!(!sections.groups[1].allows_multiple());
        assert!(!sections.groups[2].allows_multiple());
    }

    #[test]
    fn option_brief_is_wired_through() {
        let sections = parse_document(
            r#"<xkbConfigRegistry>
                 <optionList>
                   <group>
                     <configItem><name>grp</name></configItem>
                     <option>
                       <configItem>
                         <name>grp:alt_shift_toggle</name>
                         <shortDescription>AltShift</shortDescription>
                         <description>Alt+Shift toggles layout</description>
                       </configItem>
                     </option>
                   </group>
                 </optionList>
               </xkbConfigRegistry>"#,
        )
        .unwrap();

        let option = sections.groups[0].option_first().unwrap();
        assert_eq!(option.brief(), Some("AltShift"));
        assert_eq!(option.description(), Some("Alt+Shift toggles layout"));
    }

    #[test]
    fn empty_field_element_reads_as_absent() {
        let sections = parse_document(
            r#"<xkbConfigRegistry>
                 <modelList>
                   <model>
                     <configItem>
                       <name>pc104</name>
                       <description></description>
                     </configItem>
                   </model>
                 </modelList>
               </xkbConfigRegistry>"#,
        )
        .unwrap();

        assert_eq!(sections.models[0].description(), None);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(parse_document("<xkbConfigRegistry><modelList>").is_err());
    }
}
