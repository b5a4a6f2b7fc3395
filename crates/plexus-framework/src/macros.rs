// ─── Tag declaration macros ───────────────────────────────────────────────────
//
// Both macros expand to a zero-sized tag type plus the matching declaration
// trait impl, which is all `Registry::method` / `Registry::channel` need.

/// Declares a method tag for use with [`Registry::method`](crate::Registry::method).
///
/// The argument list becomes the method's `Args` tuple. The policy defaults to
/// [`FirstSuccess`](crate::FirstSuccess).
///
/// ```rust,ignore
/// method_decl!(
///     /// Looks up an account balance.
///     pub fn Balance(String) -> u64
/// );
/// method_decl!(pub fn Peers() -> String, policy = CollectAll);
///
/// let _p = registry.method::<Balance>()?.register(|(who,): &(String,)| lookup(who));
/// let all: Vec<String> = registry.method::<Peers>()?.invoke(&());
/// ```
#[macro_export]
macro_rules! method_decl {
    (
        $(#[$meta:meta])*
        $vis:vis fn $name:ident ( $($arg:ty),* $(,)? ) -> $out:ty, policy = $policy:ty $(;)?
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        $vis struct $name;

        impl $crate::MethodDecl for $name {
            type Args = ($($arg,)*);
            type Output = $out;
            type Policy = $policy;
        }
    };

    (
        $(#[$meta:meta])*
        $vis:vis fn $name:ident ( $($arg:ty),* $(,)? ) -> $out:ty $(;)?
    ) => {
        $crate::method_decl!(
            $(#[$meta])*
            $vis fn $name($($arg),*) -> $out, policy = $crate::FirstSuccess
        );
    };
}

/// Declares a channel tag for use with [`Registry::channel`](crate::Registry::channel).
///
/// The policy defaults to [`DropErrors`](crate::DropErrors).
///
/// ```rust,ignore
/// channel_decl!(pub NewBlock: u64);
///
/// let _s = registry.channel::<NewBlock>()?.subscribe(|height: &u64| index(*height));
/// ```
#[macro_export]
macro_rules! channel_decl {
    (
        $(#[$meta:meta])*
        $vis:vis $name:ident : $data:ty, policy = $policy:ty $(;)?
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        $vis struct $name;

        impl $crate::ChannelDecl for $name {
            type Data = $data;
            type Policy = $policy;
        }
    };

    (
        $(#[$meta:meta])*
        $vis:vis $name:ident : $data:ty $(;)?
    ) => {
        $crate::channel_decl!(
            $(#[$meta])*
            $vis $name: $data, policy = $crate::DropErrors
        );
    };
}
