use indexmap::IndexMap;

use crate::model::comment::Comment;
use crate::model::id::Id;

/// Error type for local comment edits
#[derive(Debug, thiserror::Error)]
pub enum CommentError {
    #[error("comment not found: {0}")]
    NotFound(Id),
    #[error("comment text is empty")]
    EmptyContent,
}

/// Where `add_reply` put a comment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// No parent requested
    Root,
    /// Appended under its parent
    Reply,
    /// Parent requested but not in the forest; kept as a root
    Orphaned,
}

// ---------------------------------------------------------------------------
// Building
// ---------------------------------------------------------------------------

/// Rebuild the reply forest from a flat batch.
///
/// Sibling order follows the batch order. A comment whose parent is not in
/// the batch becomes a root. Comments caught in a parent cycle are promoted
/// to roots (first one in batch order) so no input comment is ever lost.
/// Any `replies` already present on the input are discarded.
pub fn build_forest(flat: Vec<Comment>) -> Vec<Comment> {
    // Pass 1: index by id. On duplicate ids the first occurrence owns the id.
    let mut index: IndexMap<Id, usize> = IndexMap::with_capacity(flat.len());
    for (i, comment) in flat.iter().enumerate() {
        index.entry(comment.id.clone()).or_insert(i);
    }

    // Pass 2: link children to parents
    let mut parent_of: Vec<Option<usize>> = Vec::with_capacity(flat.len());
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); flat.len()];
    let mut roots = Vec::new();
    for (i, comment) in flat.iter().enumerate() {
        let parent = match &comment.parent_comment_id {
            None => None,
            Some(pid) => match index.get(pid) {
                Some(&p) => Some(p),
                None => {
                    tracing::debug!(comment = %comment.id, parent = %pid, "parent missing from batch, keeping comment as root");
                    None
                }
            },
        };
        match parent {
            Some(p) => children[p].push(i),
            None => roots.push(i),
        }
        parent_of.push(parent);
    }

    promote_cycles(&parent_of, &mut children, &mut roots);

    let mut slots: Vec<Option<Comment>> = flat
        .into_iter()
        .map(|mut c| {
            c.replies.clear();
            Some(c)
        })
        .collect();
    roots
        .iter()
        .filter_map(|&r| assemble(r, &mut slots, &children))
        .collect()
}

/// Detach every node not reachable from a root and make it a root itself.
fn promote_cycles(parent_of: &[Option<usize>], children: &mut [Vec<usize>], roots: &mut Vec<usize>) {
    let mut reached = vec![false; parent_of.len()];
    for &r in roots.iter() {
        mark_reachable(r, children, &mut reached);
    }

    let mut promoted = false;
    for i in 0..parent_of.len() {
        if reached[i] {
            continue;
        }
        if let Some(p) = parent_of[i] {
            children[p].retain(|&c| c != i);
        }
        tracing::debug!(index = i, "comment is part of a parent cycle, promoting to root");
        roots.push(i);
        mark_reachable(i, children, &mut reached);
        promoted = true;
    }
    if promoted {
        roots.sort_unstable();
    }
}

fn mark_reachable(start: usize, children: &[Vec<usize>], reached: &mut [bool]) {
    let mut stack = vec![start];
    while let Some(i) = stack.pop() {
        if reached[i] {
            continue;
        }
        reached[i] = true;
        stack.extend(children[i].iter().copied());
    }
}

fn assemble(i: usize, slots: &mut [Option<Comment>], children: &[Vec<usize>]) -> Option<Comment> {
    let mut comment = slots[i].take()?;
    comment.replies = children[i]
        .iter()
        .filter_map(|&c| assemble(c, slots, children))
        .collect();
    Some(comment)
}

// ---------------------------------------------------------------------------
// Incremental edits
// ---------------------------------------------------------------------------

/// Insert `comment` as a new leaf under `parent_id`, or as a new root.
///
/// Gives the same shape a full `build_forest` would, including the orphan
/// rule: a missing parent leaves the comment at the top level.
pub fn add_reply(forest: &mut Vec<Comment>, parent_id: Option<&Id>, mut comment: Comment) -> Placement {
    comment.parent_comment_id = parent_id.cloned();
    let Some(pid) = parent_id else {
        forest.push(comment);
        return Placement::Root;
    };
    match find_mut(forest, pid) {
        Some(parent) => {
            parent.replies.push(comment);
            Placement::Reply
        }
        None => {
            tracing::debug!(comment = %comment.id, parent = %pid, "reply target not found, adding as root");
            forest.push(comment);
            Placement::Orphaned
        }
    }
}

/// Replace a comment's text and flag it as edited
pub fn edit_comment(forest: &mut [Comment], id: &Id, content: &str) -> Result<(), CommentError> {
    if content.trim().is_empty() {
        return Err(CommentError::EmptyContent);
    }
    let comment = find_mut(forest, id).ok_or_else(|| CommentError::NotFound(id.clone()))?;
    comment.content = content.to_string();
    comment.edited = true;
    Ok(())
}

/// Remove a comment together with its replies
pub fn remove_comment(forest: &mut Vec<Comment>, id: &Id) -> Result<Comment, CommentError> {
    if let Some(pos) = forest.iter().position(|c| &c.id == id) {
        return Ok(forest.remove(pos));
    }
    for comment in forest.iter_mut() {
        if let Ok(removed) = remove_comment(&mut comment.replies, id) {
            return Ok(removed);
        }
    }
    Err(CommentError::NotFound(id.clone()))
}

/// Flip the viewer's like on a comment. Returns the new like count.
pub fn toggle_like(forest: &mut [Comment], id: &Id) -> Result<u32, CommentError> {
    let comment = find_mut(forest, id).ok_or_else(|| CommentError::NotFound(id.clone()))?;
    if comment.liked_by_user {
        comment.likes = comment.likes.saturating_sub(1);
    } else {
        comment.likes += 1;
    }
    comment.liked_by_user = !comment.liked_by_user;
    Ok(comment.likes)
}

// ---------------------------------------------------------------------------
// Traversal
// ---------------------------------------------------------------------------

pub fn find<'a>(forest: &'a [Comment], id: &Id) -> Option<&'a Comment> {
    for comment in forest {
        if &comment.id == id {
            return Some(comment);
        }
        if let Some(c) = find(&comment.replies, id) {
            return Some(c);
        }
    }
    None
}

pub fn find_mut<'a>(forest: &'a mut [Comment], id: &Id) -> Option<&'a mut Comment> {
    for comment in forest.iter_mut() {
        if &comment.id == id {
            return Some(comment);
        }
        if let Some(c) = find_mut(&mut comment.replies, id) {
            return Some(c);
        }
    }
    None
}

/// Total number of comments in the forest
pub fn count(forest: &[Comment]) -> usize {
    forest.iter().map(|c| 1 + count(&c.replies)).sum()
}

/// Pre-order walk yielding `(depth, comment)`
pub fn flatten_preorder(forest: &[Comment]) -> Vec<(usize, &Comment)> {
    let mut out = Vec::new();
    walk(forest, 0, &mut out);
    out
}

fn walk<'a>(forest: &'a [Comment], depth: usize, out: &mut Vec<(usize, &'a Comment)>) {
    for comment in forest {
        out.push((depth, comment));
        walk(&comment.replies, depth + 1, out);
    }
}
