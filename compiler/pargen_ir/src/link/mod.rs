//! Declaration linker.
//!
//! Turns [`Declarations`] into a [`GrammarTable`]:
//!
//! - a declaration with several phrases (or any variant-tagged phrase)
//!   becomes a Switch whose alternatives are one Compound per phrase,
//!   named `Decl_phrase`
//! - a single-phrase declaration becomes a Compound named `Decl`
//! - an alias becomes an Alias node
//! - every token part becomes its own Immediate node
//!
//! Field layout of each phrase element: a phrase reference stores into a
//! field named after the referenced declaration in `snake_case`, any and
//! predicate tokens into `token`, literals nowhere. `named()` overrides
//! all three. Sequence parts produce list fields.
//!
//! Upward anchors resolve to a (switch index, compound index) pair: the
//! phrase's position in the target declaration and the number of
//! entry-producing parts before the label.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::declaration::{Declaration, Declarations, PartKind, Phrase, PhrasePart};
use crate::element::{ElementFactory, ElementLayout, FieldDef, FieldKind};
use crate::error::GrammarError;
use crate::grammar::{
    CompoundGrammar, EntryFlags, Grammar, GrammarEntry, GrammarKind, GrammarTable, JumpEntry,
    SubgrammarEntry, SwitchEntry, SwitchGrammar, TokenMatcher,
};
use crate::grammar_id::GrammarId;

impl<U> Declarations<U> {
    /// Resolve all names and build the grammar table.
    #[tracing::instrument(level = "debug", skip_all, fields(declarations = self.decls.len()))]
    pub fn link(self) -> Result<GrammarTable<U>, GrammarError> {
        let table = Linker::new(self.decls)?.link()?;
        debug!(grammars = table.len(), "linked grammar");
        Ok(table)
    }
}

/// Where a declaration's grammar nodes live in the table.
struct DeclSlot {
    id: GrammarId,
    /// Per-phrase alternative ids; empty unless the declaration is a switch.
    alternatives: Vec<GrammarId>,
    phrases: Vec<Box<str>>,
    /// Per-phrase label positions.
    labels: Vec<FxHashMap<Box<str>, usize>>,
}

struct Linker<U> {
    decls: Vec<Declaration<U>>,
    index: FxHashMap<Box<str>, usize>,
    slots: Vec<DeclSlot>,
    table: GrammarTable<U>,
}

impl<U> Linker<U> {
    fn new(decls: Vec<Declaration<U>>) -> Result<Self, GrammarError> {
        let mut index = FxHashMap::default();
        for (i, decl) in decls.iter().enumerate() {
            if index.insert(decl.name.clone(), i).is_some() {
                return Err(GrammarError::DuplicateDeclaration(decl.name.clone()));
            }
        }

        Ok(Linker {
            decls,
            index,
            slots: Vec::new(),
            table: GrammarTable::new(),
        })
    }

    fn link(mut self) -> Result<GrammarTable<U>, GrammarError> {
        self.reserve()?;

        let decls = std::mem::take(&mut self.decls);
        for (i, decl) in decls.into_iter().enumerate() {
            self.build_declaration(i, decl)?;
        }

        self.validate()?;
        Ok(self.table)
    }

    /// Allocate placeholder nodes for every declaration and alternative,
    /// so forward references resolve before anything is built.
    fn reserve(&mut self) -> Result<(), GrammarError> {
        for decl in &self.decls {
            if decl.alias.is_some() {
                if !decl.phrases.is_empty() {
                    return Err(GrammarError::AliasWithPhrases(decl.name.clone()));
                }
                let id = self.table.push(placeholder(&decl.name), true)?;
                self.slots.push(DeclSlot {
                    id,
                    alternatives: Vec::new(),
                    phrases: Vec::new(),
                    labels: Vec::new(),
                });
                continue;
            }

            if decl.phrases.is_empty() {
                return Err(GrammarError::EmptyDeclaration(decl.name.clone()));
            }

            let id = self.table.push(placeholder(&decl.name), true)?;
            let alternatives = if is_switch(decl) {
                decl.phrases
                    .iter()
                    .map(|phrase| {
                        let name = format!("{}_{}", decl.name, phrase.name);
                        self.table.push(placeholder(&name), false)
                    })
                    .collect::<Result<_, _>>()?
            } else {
                Vec::new()
            };

            let labels = decl
                .phrases
                .iter()
                .map(|phrase| label_positions(&decl.name, phrase))
                .collect::<Result<_, _>>()?;

            self.slots.push(DeclSlot {
                id,
                alternatives,
                phrases: decl.phrases.iter().map(|p| p.name.clone()).collect(),
                labels,
            });
        }
        Ok(())
    }

    fn build_declaration(&mut self, index: usize, decl: Declaration<U>) -> Result<(), GrammarError> {
        let Declaration {
            name,
            alias,
            phrases,
            hooks,
        } = decl;
        let id = self.slots[index].id;

        let kind = if let Some(target) = alias {
            GrammarKind::Alias(self.resolve(&name, &target)?)
        } else if self.slots[index].alternatives.is_empty() {
            let phrase = phrases
                .into_iter()
                .next()
                .ok_or_else(|| GrammarError::EmptyDeclaration(name.clone()))?;
            GrammarKind::Compound(self.build_compound(name.to_string(), phrase.parts)?)
        } else {
            let mut entries = Vec::with_capacity(phrases.len());
            for (i, phrase) in phrases.into_iter().enumerate() {
                let alternative = self.slots[index].alternatives[i];
                let element_name = format!("{}_{}", name, phrase.name);
                let compound = self.build_compound(element_name, phrase.parts)?;
                self.table.get_mut(alternative).kind = GrammarKind::Compound(compound);
                entries.push(SwitchEntry {
                    grammar: alternative,
                    variants: phrase.variants,
                    transitions: None,
                });
            }
            GrammarKind::Switch(SwitchGrammar { entries })
        };

        let grammar = self.table.get_mut(id);
        grammar.kind = kind;
        grammar.hooks = hooks;
        Ok(())
    }

    fn build_compound(
        &mut self,
        element_name: String,
        parts: Vec<PhrasePart<U>>,
    ) -> Result<CompoundGrammar<U>, GrammarError> {
        let mut fields: Vec<FieldDef> = Vec::new();
        let mut entries = Vec::with_capacity(parts.len());

        for part in parts {
            let PhrasePart {
                kind,
                flags,
                field,
                hooks,
            } = part;

            let (grammar, default_field) = match kind {
                PartKind::Label(_) => continue,
                PartKind::InlineMatch(f) => {
                    entries.push(GrammarEntry::InlineMatch(f));
                    continue;
                }
                PartKind::Anchor(anchor) => {
                    let target = self.index.get(&anchor.declaration).copied().ok_or_else(|| {
                        GrammarError::UnknownDeclaration {
                            referrer: element_name.clone().into(),
                            name: anchor.declaration.clone(),
                        }
                    })?;
                    let slot = &self.slots[target];
                    if slot.alternatives.is_empty() {
                        return Err(GrammarError::JumpTargetNotSwitch(anchor.declaration));
                    }
                    let switch_index = self
                        .phrase_index(target, &anchor.phrase)
                        .ok_or_else(|| GrammarError::UnknownPhrase {
                            declaration: anchor.declaration.clone(),
                            phrase: anchor.phrase.clone(),
                        })?;
                    let compound_index = slot.labels[switch_index]
                        .get(&anchor.label)
                        .copied()
                        .ok_or_else(|| GrammarError::UnknownLabel {
                            declaration: anchor.declaration.clone(),
                            phrase: anchor.phrase.clone(),
                            label: anchor.label.clone(),
                        })?;
                    entries.push(GrammarEntry::Jump(JumpEntry {
                        switch: slot.id,
                        switch_index,
                        compound_index,
                        predicate: anchor.predicate,
                    }));
                    continue;
                }
                PartKind::Phrase(reference) => {
                    let grammar = self.resolve(&element_name, &reference)?;
                    (grammar, Some(snake_case(&reference)))
                }
                PartKind::Token(matcher) => {
                    let (name, default_field) = match &matcher {
                        TokenMatcher::Exact(text) => (format!("'{text}'"), None),
                        TokenMatcher::Any => ("<any>".to_string(), Some("token".to_string())),
                        TokenMatcher::Predicate(_) => {
                            ("<predicate>".to_string(), Some("token".to_string()))
                        }
                    };
                    let mut grammar = Grammar::new(name, GrammarKind::Immediate(matcher));
                    grammar.hooks = hooks;
                    (self.table.push(grammar, false)?, default_field)
                }
            };

            let field_index = match field.map(String::from).or(default_field) {
                Some(field_name) => {
                    if fields.iter().any(|f| *f.name == *field_name) {
                        return Err(GrammarError::DuplicateField {
                            element: element_name.into(),
                            field: field_name.into(),
                        });
                    }
                    let kind = if flags.contains(EntryFlags::SEQUENCE) {
                        FieldKind::List
                    } else {
                        FieldKind::Single
                    };
                    fields.push(FieldDef {
                        name: field_name.into(),
                        kind,
                    });
                    Some(fields.len() - 1)
                }
                None => None,
            };

            entries.push(GrammarEntry::Subgrammar(SubgrammarEntry {
                grammar,
                flags,
                field: field_index,
            }));
        }

        Ok(CompoundGrammar {
            entries,
            factory: ElementFactory::new(ElementLayout::new(element_name, fields)),
        })
    }

    fn resolve(&self, referrer: &str, name: &str) -> Result<GrammarId, GrammarError> {
        self.index
            .get(name)
            .map(|&i| self.slots[i].id)
            .ok_or_else(|| GrammarError::UnknownDeclaration {
                referrer: referrer.into(),
                name: name.into(),
            })
    }

    fn phrase_index(&self, decl: usize, phrase: &str) -> Option<usize> {
        self.slots[decl].phrases.iter().position(|p| **p == *phrase)
    }

    fn validate(&self) -> Result<(), GrammarError> {
        self.validate_aliases()?;

        for slot in &self.slots {
            let grammar = self.table.get(slot.id);
            match &grammar.kind {
                GrammarKind::Compound(compound) => {
                    let Some(first) = compound.first_subgrammar() else {
                        continue;
                    };
                    if self.resolve_alias(first.grammar) == slot.id {
                        return Err(GrammarError::LeftRecursiveCompound(grammar.name.clone()));
                    }
                }
                GrammarKind::Switch(switch) => {
                    for entry in &switch.entries {
                        let alternative = self.table.get(entry.grammar);
                        let Some(compound) = alternative.as_compound() else {
                            continue;
                        };
                        let (Some(index), Some(first)) =
                            (compound.first_subgrammar_index(), compound.first_subgrammar())
                        else {
                            continue;
                        };
                        if first.grammar == slot.id {
                            if index > 0 {
                                return Err(GrammarError::LeadingInlineMatch(
                                    alternative.name.clone(),
                                ));
                            }
                        } else if self.resolve_alias(first.grammar) == slot.id {
                            return Err(GrammarError::IndirectLeftRecursion(
                                alternative.name.clone(),
                            ));
                        }
                    }
                }
                GrammarKind::Immediate(_) | GrammarKind::Alias(_) => {}
            }
        }
        Ok(())
    }

    fn validate_aliases(&self) -> Result<(), GrammarError> {
        for slot in &self.slots {
            let mut seen = FxHashSet::default();
            let mut cur = slot.id;
            while let GrammarKind::Alias(target) = self.table.get(cur).kind {
                if !seen.insert(cur) {
                    return Err(GrammarError::AliasCycle(self.table.get(slot.id).name.clone()));
                }
                cur = target;
            }
        }
        Ok(())
    }

    /// Follow alias links. Only called after alias cycles are ruled out.
    fn resolve_alias(&self, mut id: GrammarId) -> GrammarId {
        while let GrammarKind::Alias(target) = self.table.get(id).kind {
            id = target;
        }
        id
    }
}

fn placeholder<U>(name: &str) -> Grammar<U> {
    Grammar::new(name, GrammarKind::Alias(GrammarId::INVALID))
}

fn is_switch<U>(decl: &Declaration<U>) -> bool {
    decl.phrases.len() > 1 || decl.phrases.iter().any(|p| !p.variants.is_empty())
}

/// Label name to the number of entry-producing parts before it.
fn label_positions<U>(
    decl_name: &str,
    phrase: &Phrase<U>,
) -> Result<FxHashMap<Box<str>, usize>, GrammarError> {
    let mut labels = FxHashMap::default();
    let mut entries = 0;
    for part in &phrase.parts {
        if let PartKind::Label(label) = &part.kind {
            if labels.insert(label.clone(), entries).is_some() {
                return Err(GrammarError::DuplicateLabel {
                    element: format!("{decl_name}_{}", phrase.name).into(),
                    label: label.clone(),
                });
            }
        } else {
            entries += 1;
        }
    }
    Ok(labels)
}

/// `AddExpr` -> `add_expr`, `ID` -> `id`.
fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.extend(c.to_lowercase());
            prev_lower = false;
        } else {
            out.push(c);
            prev_lower = c.is_lowercase() || c.is_ascii_digit();
        }
    }
    out
}
